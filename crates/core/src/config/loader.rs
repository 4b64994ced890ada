use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable holding the provider API key when none is configured.
pub const API_KEY_ENV: &str = "PLANET_API_KEY";

/// Load configuration: defaults, then the optional TOML file, then `SCENEFETCH_*`
/// environment overrides (`SCENEFETCH_PROVIDER__API_KEY` sets `provider.api_key`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed("SCENEFETCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(with_api_key_fallback(config, std::env::var(API_KEY_ENV).ok()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Fills an empty `provider.api_key` from `fallback`.
pub fn with_api_key_fallback(mut config: Config, fallback: Option<String>) -> Config {
    if config.provider.api_key.is_empty() {
        if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
            config.provider.api_key = key;
        }
    }
    config
}
