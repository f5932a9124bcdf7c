use crate::config::types::{ApiConfig, Config, FetchConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest gate width accepted for any concurrency setting
const MAX_GATE_WIDTH: usize = 5000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates remote API settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1 second".to_string(),
        ));
    }

    if config.connect_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.client_name.is_empty() {
        return Err(ConfigError::Validation(
            "client-name cannot be empty".to_string(),
        ));
    }

    if !config
        .client_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "client-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.client_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates concurrency and batching settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("page-concurrency", config.page_concurrency),
        ("batch-concurrency", config.batch_concurrency),
        ("id-concurrency", config.id_concurrency),
    ] {
        validate_gate_width(name, value)?;
    }

    if config.id_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "id-batch-size must be >= 1, got {}",
            config.id_batch_size
        )));
    }

    validate_fan_out(
        "page-concurrency",
        config.page_concurrency,
        1,
        config.max_connections,
    )?;
    validate_fan_out(
        "batch-concurrency",
        config.batch_concurrency,
        config.id_concurrency,
        config.max_connections,
    )?;

    Ok(())
}

/// Validates a single concurrency gate width
pub(crate) fn validate_gate_width(name: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_GATE_WIDTH {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_GATE_WIDTH, value
        )));
    }
    Ok(())
}

/// Validates an outer gate against the outbound connection budget
///
/// Every unit in flight may hold `per_unit` requests, so
/// `gate * per_unit` must not exceed `max_connections`.
pub(crate) fn validate_fan_out(
    name: &str,
    gate: usize,
    per_unit: usize,
    max_connections: usize,
) -> Result<(), ConfigError> {
    validate_gate_width(name, gate)?;

    let product = gate.saturating_mul(per_unit);
    if product > max_connections {
        return Err(ConfigError::Validation(format!(
            "{} * requests per unit ({} * {} = {}) exceeds max-connections ({})",
            name, gate, per_unit, product, max_connections
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.id_list_path.is_empty() {
        return Err(ConfigError::Validation(
            "id-list-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
