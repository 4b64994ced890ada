//! Types for the lifecycle orchestrator.

use thiserror::Error;

use crate::activator::ActivationError;
use crate::downloader::{DownloadError, DownloadOutcome};
use crate::ledger::LedgerError;
use crate::provider::ProviderError;

/// Whether a run downloads or stops once activation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Download,
    /// Request activation without waiting for it or downloading.
    ActivateOnly,
}

impl RunMode {
    pub fn from_activate_only(activate_only: bool) -> Self {
        if activate_only {
            Self::ActivateOnly
        } else {
            Self::Download
        }
    }

    pub fn is_activate_only(&self) -> bool {
        matches!(self, Self::ActivateOnly)
    }
}

/// How a work item finished successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The asset was fetched in this run.
    Downloaded(DownloadOutcome),
    /// Ledger and disk both show the file; nothing was requested.
    AlreadyDownloaded,
    /// Activate-only mode stopped after activation was requested or found recorded.
    Activated,
}

impl ItemOutcome {
    /// Label used for item metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded(_) => "downloaded",
            Self::AlreadyDownloaded => "already_downloaded",
            Self::Activated => "activated",
        }
    }
}

/// Why one work item failed. Local to that item; the run continues.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("asset links unavailable: {0}")]
    Links(#[from] ProviderError),

    #[error("activation failed: {0}")]
    Activation(#[from] ActivationError),

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// A failed work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub key: String,
    pub error: String,
}

/// Tally of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: Vec<FailedItem>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.successful == self.total
    }
}
