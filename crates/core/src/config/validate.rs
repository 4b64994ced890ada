use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Provider base URL is set
/// - Retry ceiling, timeouts, chunk size and concurrency are not 0
/// - Poll interval is not 0 and fits inside the poll timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.provider.base_url.trim().is_empty() {
        return invalid("provider.base_url cannot be empty");
    }
    if config.retry.max_attempts == 0 {
        return invalid("retry.max_attempts cannot be 0");
    }
    if config.timeouts.request_secs == 0 || config.timeouts.download_secs == 0 {
        return invalid("timeouts cannot be 0");
    }
    if config.activation.poll_interval_secs == 0 {
        return invalid("activation.poll_interval_secs cannot be 0");
    }
    if config.activation.poll_interval_secs > config.activation.poll_timeout_secs {
        return invalid("activation.poll_interval_secs cannot exceed poll_timeout_secs");
    }
    if config.download.chunk_size == 0 {
        return invalid("download.chunk_size cannot be 0");
    }
    if config.orchestrator.max_concurrent_items == 0 {
        return invalid("orchestrator.max_concurrent_items cannot be 0");
    }

    Ok(())
}

/// Returns the provider API key, or an error when none is configured.
pub fn require_api_key(config: &Config) -> Result<&str, ConfigError> {
    let key = config.provider.api_key.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    Ok(key)
}
