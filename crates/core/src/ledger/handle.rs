use tokio::sync::{mpsc, oneshot};

use super::{AssetKey, AssetRecord, LedgerError};

/// A ledger mutation requested by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Requested,
    Active,
    Downloaded,
    /// The file recorded as downloaded is missing on disk.
    DownloadCleared,
}

#[derive(Debug)]
pub(super) enum LedgerCommand {
    Read {
        key: AssetKey,
        reply: oneshot::Sender<AssetRecord>,
    },
    Apply {
        key: AssetKey,
        transition: Transition,
        reply: oneshot::Sender<Result<bool, LedgerError>>,
    },
}

/// Handle to the ledger task.
///
/// Cheaply cloneable. All reads and writes are serialized through the task, so concurrent
/// work items cannot interleave a read-modify-write.
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<LedgerCommand>,
}

impl LedgerHandle {
    pub(super) fn new(tx: mpsc::Sender<LedgerCommand>) -> Self {
        Self { tx }
    }

    /// Current record for `key`.
    pub async fn record(&self, key: &AssetKey) -> Result<AssetRecord, LedgerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(LedgerCommand::Read {
                key: key.clone(),
                reply,
            })
            .await
            .map_err(|_| LedgerError::Closed)?;
        rx.await.map_err(|_| LedgerError::Closed)
    }

    /// Applies a transition and persists the ledger if it changed.
    ///
    /// Returns whether the ledger changed. On a failed save the in-memory ledger is
    /// rolled back, so memory never runs ahead of disk.
    pub async fn apply(&self, key: &AssetKey, transition: Transition) -> Result<bool, LedgerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(LedgerCommand::Apply {
                key: key.clone(),
                transition,
                reply,
            })
            .await
            .map_err(|_| LedgerError::Closed)?;
        rx.await.map_err(|_| LedgerError::Closed)?
    }
}
