use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::activator::ActivationConfig;
use crate::downloader::DownloadConfig;
use crate::http::{RetryPolicy, TimeoutConfig};
use crate::layout::OutputConfig;
use crate::ledger::LedgerConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::provider::ProviderConfig;

/// Root configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Also append log lines to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Where to write the Prometheus text dump at the end of a run, if anywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Sanitized config for log output (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub provider: SanitizedProviderConfig,
    pub retry: RetryPolicy,
    pub timeouts: TimeoutConfig,
    pub activation: ActivationConfig,
    pub download: DownloadConfig,
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
    pub orchestrator: OrchestratorConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub base_url: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            provider: SanitizedProviderConfig {
                base_url: config.provider.base_url.clone(),
                api_key_configured: !config.provider.api_key.is_empty(),
            },
            retry: config.retry.clone(),
            timeouts: config.timeouts.clone(),
            activation: config.activation.clone(),
            download: config.download.clone(),
            ledger: config.ledger.clone(),
            output: config.output.clone(),
            orchestrator: config.orchestrator.clone(),
            logging: config.logging.clone(),
            metrics: config.metrics.clone(),
        }
    }
}
