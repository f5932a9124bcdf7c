//! Configuration module for Dorg-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not an error at this level: callers that have no file use
//! [`Config::default`], which carries the documented defaults.
//!
//! # Example
//!
//! ```no_run
//! use dorg_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Page gate width: {}", config.fetch.page_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, FetchConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
pub(crate) use validation::validate_fan_out;
