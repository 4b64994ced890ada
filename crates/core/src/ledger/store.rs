//! Storage port for the ledger.

use super::{Ledger, LedgerError};

/// Persists whole-ledger snapshots.
///
/// One process owns a store at a time. Nothing here guards against a second process
/// writing the same file; interleaved writers can lose each other's updates.
pub trait LedgerStore: Send + Sync {
    /// Loads the last snapshot, or an empty ledger if none was ever saved.
    fn load(&self) -> Result<Ledger, LedgerError>;

    /// Replaces the snapshot. A crash mid-save must leave the previous snapshot readable.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;
}
