use std::sync::Arc;

use tokio::sync::mpsc;

use super::handle::{LedgerCommand, Transition};
use super::{AssetKey, Ledger, LedgerError, LedgerHandle, LedgerStore};

/// Task that owns the in-memory ledger and is its only writer.
pub struct LedgerWriter {
    rx: mpsc::Receiver<LedgerCommand>,
    store: Arc<dyn LedgerStore>,
    ledger: Ledger,
}

impl LedgerWriter {
    pub(super) fn new(
        rx: mpsc::Receiver<LedgerCommand>,
        store: Arc<dyn LedgerStore>,
        ledger: Ledger,
    ) -> Self {
        Self { rx, store, ledger }
    }

    /// Serves commands until every handle is dropped, then returns the final ledger.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) -> Ledger {
        tracing::debug!("Ledger writer started");

        while let Some(command) = self.rx.recv().await {
            match command {
                LedgerCommand::Read { key, reply } => {
                    let _ = reply.send(self.ledger.record(&key));
                }
                LedgerCommand::Apply {
                    key,
                    transition,
                    reply,
                } => {
                    let _ = reply.send(self.apply(&key, transition));
                }
            }
        }

        tracing::debug!("Ledger writer shutting down");
        self.ledger
    }

    fn apply(&mut self, key: &AssetKey, transition: Transition) -> Result<bool, LedgerError> {
        let previous = self.ledger.clone();

        let changed = match transition {
            Transition::Requested => self.ledger.mark_requested(key),
            Transition::Active => self.ledger.mark_active(key),
            Transition::Downloaded => self.ledger.mark_downloaded(key)?,
            Transition::DownloadCleared => self.ledger.clear_downloaded(key),
        };

        if !changed {
            return Ok(false);
        }

        if let Err(e) = self.store.save(&self.ledger) {
            tracing::error!(key = %key, "Failed to persist ledger: {}", e);
            self.ledger = previous;
            return Err(e);
        }

        tracing::info!(key = %key, ?transition, "Ledger updated");
        Ok(true)
    }
}

/// Creates a ledger task seeded with `ledger`.
///
/// Returns:
/// - `LedgerHandle` - clone this to share across work items
/// - `LedgerWriter` - spawn this with `tokio::spawn(writer.run())`
pub fn create_ledger_system(
    store: Arc<dyn LedgerStore>,
    ledger: Ledger,
    buffer_size: usize,
) -> (LedgerHandle, LedgerWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = LedgerHandle::new(tx);
    let writer = LedgerWriter::new(rx, store, ledger);
    (handle, writer)
}
