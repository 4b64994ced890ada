//! Durable status ledger.
//!
//! Records, per asset key, whether activation was requested or observed active and
//! whether the file was downloaded. The ledger is what makes a run safe to repeat:
//! activation is requested at most once per key, and finished downloads are skipped.
//!
//! - [`Ledger`]: the in-memory snapshot with monotonic transitions
//! - [`LedgerStore`]: storage port; [`JsonFileLedgerStore`] is the production store
//! - [`LedgerHandle`] / [`LedgerWriter`]: a single task owning the snapshot during a run

mod handle;
mod json_file;
mod store;
mod types;
mod writer;

pub use handle::{LedgerHandle, Transition};
pub use json_file::JsonFileLedgerStore;
pub use store::LedgerStore;
pub use types::{ActivationState, AssetKey, AssetRecord, Ledger, LedgerSummary};
pub use writer::{create_ledger_system, LedgerWriter};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The persisted file exists but cannot be decoded. Fatal to a run.
    #[error("Ledger file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to read ledger file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write ledger file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot mark {key} downloaded: asset is not active")]
    NotActive { key: String },

    #[error("Ledger task is no longer running")]
    Closed,
}

/// Ledger location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("planet_status.json")
}
