//! HTTP client for the paginated REST API
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests that decode the API's list envelope
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::Config;
use crate::link::endpoint_url;
use crate::{HarvestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// One response page of the list envelope
///
/// The API wraps every listing as `{"self": .., "first": .., "last": ..,
/// "list": [..]}`. Only the records and the last-page link are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub list: Vec<Value>,

    /// Absolute URL of the last page, absent on empty listings
    #[serde(default)]
    pub last: Option<String>,
}

/// Builds an HTTP client with proper configuration
///
/// The idle pool is sized to `max-connections` so a wide gate does not
/// churn connections.
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    // Format: ClientName/Version (+ContactURL)
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .default_headers(headers)
        .timeout(config.api.request_timeout())
        .connect_timeout(config.api.connect_timeout())
        .pool_max_idle_per_host(config.fetch.max_connections)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Exponential backoff: `base * 2^(attempt - 1)` (1s, 2s, 4s, ... for a 1s base)
pub fn backoff_duration(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor)
}

/// GET-only client bound to one API base URL
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Creates a client from the `[api]`, `[user-agent]` and `[fetch]` sections
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Wraps an existing reqwest client
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.api.base_url.clone(),
            max_retries: config.api.max_retries,
            retry_delay: config.api.retry_delay(),
        }
    }

    /// Builds the request URL for an endpoint and ordered query pairs
    pub fn request_url(&self, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = endpoint_url(&self.base_url, endpoint)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Fetches one listing page, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx, valid JSON | Return the page |
    /// | HTTP 429 | Retry with backoff |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout / connect error | Retry with backoff |
    /// | Other HTTP 4xx | Fail immediately |
    /// | Malformed JSON | Fail immediately |
    pub async fn get_page(&self, endpoint: &str, query: &[(String, String)]) -> Result<ApiPage> {
        let url = self.request_url(endpoint, query)?;

        let mut attempt = 0u32;
        loop {
            match self.get_once(&url).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.max_retries && e.is_transient() => {
                    attempt += 1;
                    let delay = backoff_duration(self.retry_delay, attempt);
                    tracing::debug!(
                        "GET {} attempt {}/{} failed: {}, retrying in {:?}",
                        url,
                        attempt,
                        self.max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &Url) -> Result<ApiPage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| HarvestError::Json {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
