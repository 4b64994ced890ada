//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the lifecycle orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Work items driven at the same time.
    /// 1 processes items strictly one after another.
    #[serde(default = "default_max_concurrent_items")]
    pub max_concurrent_items: usize,
}

fn default_max_concurrent_items() -> usize {
    1
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: default_max_concurrent_items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_items, 1);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_concurrent_items, 1);

        let config: OrchestratorConfig = toml::from_str("max_concurrent_items = 4").unwrap();
        assert_eq!(config.max_concurrent_items, 4);
    }
}
