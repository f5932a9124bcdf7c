use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Dorg-Harvest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults documented on each field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Remote API connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API (default: `https://www.drupal.org/api-d7`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Timeout for a single request, in seconds (default: 30)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Timeout for establishing a connection, in seconds (default: 10)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Retries for a transient request failure (default: 3)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds, doubled per attempt (default: 1000)
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.drupal.org/api-d7".to_string(),
            request_timeout: 30,
            connect_timeout: 10,
            max_retries: 3,
            retry_delay: 1000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the client (default: `dorg-harvest`)
    #[serde(rename = "client-name")]
    pub client_name: String,

    /// Version of the client (default: the crate version)
    #[serde(rename = "client-version")]
    pub client_version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.client_name, self.client_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            client_name: "dorg-harvest".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://www.drupal.org/about".to_string(),
        }
    }
}

/// Concurrency and batching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Concurrent page units for page-indexed datasets (default: 100)
    #[serde(rename = "page-concurrency")]
    pub page_concurrency: usize,

    /// Concurrent ID-batch units for the comment aggregation (default: 10)
    #[serde(rename = "batch-concurrency")]
    pub batch_concurrency: usize,

    /// Number of IDs per batch unit (default: 1000)
    #[serde(rename = "id-batch-size")]
    pub id_batch_size: usize,

    /// Concurrent per-ID lookups inside one batch unit (default: 100)
    #[serde(rename = "id-concurrency")]
    pub id_concurrency: usize,

    /// Upper bound on simultaneous outbound connections (default: 5000)
    #[serde(rename = "max-connections")]
    pub max_connections: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_concurrency: 100,
            batch_concurrency: 10,
            id_batch_size: 1000,
            id_concurrency: 100,
            max_connections: 5000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory holding one sub-directory of chunks per dataset (default: `data/json`)
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Side file holding the materialized user ID list (default: `data/json/uids.json`)
    #[serde(rename = "id-list-path")]
    pub id_list_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/json".to_string(),
            id_list_path: "data/json/uids.json".to_string(),
        }
    }
}
