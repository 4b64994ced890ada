//! JSON file ledger store.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{Ledger, LedgerError, LedgerStore};

/// Stores the ledger as a pretty-printed JSON file.
///
/// Saves go to `{path}.tmp` first and are renamed over `path`, so readers only ever see
/// a complete snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn encode(ledger: &Ledger) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        ledger.serialize(&mut serializer)?;
        Ok(buf)
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn load(&self) -> Result<Ledger, LedgerError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No ledger file yet, starting empty");
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(LedgerError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| LedgerError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let write_err = |source: std::io::Error| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        let bytes = Self::encode(ledger)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let temp = self.temp_path();
        let mut file = File::create(&temp).map_err(write_err)?;
        file.write_all(&bytes).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(write_err)?;
        Ok(())
    }
}
