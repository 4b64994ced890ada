//! Activation polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationConfig {
    /// Give up waiting for `active` after this long.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Fixed pause between status checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl ActivationConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
