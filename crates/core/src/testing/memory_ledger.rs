//! In-memory ledger store for testing.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::ledger::{Ledger, LedgerError, LedgerStore};

#[derive(Default)]
struct State {
    current: Option<Ledger>,
    saves: usize,
    fail_saves: bool,
    corrupt: bool,
}

/// Mock implementation of the LedgerStore trait.
///
/// `load` returns the last saved ledger (or the seeded one, or an empty ledger).
/// Saves can be made to fail and loads can be made to report corruption.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<State>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what the next `load` returns, without counting as a save.
    pub fn seed(&self, ledger: Ledger) {
        self.state.lock().unwrap().current = Some(ledger);
    }

    /// The last successfully saved ledger.
    pub fn saved(&self) -> Option<Ledger> {
        let state = self.state.lock().unwrap();
        if state.saves == 0 {
            return None;
        }
        state.current.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    pub fn fail_saves(&self, fail: bool) {
        self.state.lock().unwrap().fail_saves = fail;
    }

    /// Makes `load` report a corrupt ledger.
    pub fn corrupt(&self) {
        self.state.lock().unwrap().corrupt = true;
    }

    fn path() -> PathBuf {
        PathBuf::from("memory://ledger")
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Ledger, LedgerError> {
        let state = self.state.lock().unwrap();
        if state.corrupt {
            return Err(LedgerError::Corrupt {
                path: Self::path(),
                reason: "simulated corruption".to_string(),
            });
        }
        Ok(state.current.clone().unwrap_or_default())
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_saves {
            return Err(LedgerError::Write {
                path: Self::path(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        state.current = Some(ledger.clone());
        state.saves += 1;
        Ok(())
    }
}
