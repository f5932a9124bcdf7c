//! Dorg-Harvest: a resumable harvester for the Drupal.org REST API
//!
//! This crate discovers how many pages a paginated `api-d7` endpoint exposes,
//! fetches every page under a concurrency cap, projects each record through a
//! static field mapping, and writes one JSON chunk per unit of work so that an
//! interrupted run can be resumed.

pub mod config;
pub mod dataset;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod shutdown;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page count unavailable for dataset '{dataset}': {reason}")]
    CountUnavailable { dataset: String, reason: String },

    #[error("Fetch failed for {unit}: {reason}")]
    UnitFetchFailed { unit: String, reason: String },

    #[error("Failed to write chunk {path}: {source}")]
    ChunkWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed JSON from {url}: {message}")]
    Json { url: String, message: String },

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("ID list error: {0}")]
    IdList(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if retrying the same request may succeed
    ///
    /// Timeouts, connection failures, HTTP 5xx and HTTP 429 are transient.
    /// Other client errors and malformed bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } | Self::Reqwest(source) => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{Dataset, ResourceDescriptor};
pub use output::{ChunkWriter, RunReport};
pub use pipeline::{Orchestrator, RunOptions, Scheduler};
pub use state::{UnitOutcome, WorkUnit};
