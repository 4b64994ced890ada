//! Downloader error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Asset {key} is not ready for download (status: {status})")]
    NotReady { key: String, status: String },

    #[error("Asset {key} is active but has no download location")]
    MissingLocation { key: String },

    #[error("Failed to check status of {key}: {source}")]
    StatusCheckFailed {
        key: String,
        #[source]
        source: ProviderError,
    },

    #[error("Transfer of {key} failed: {source}")]
    TransferFailed {
        key: String,
        #[source]
        source: HttpError,
    },

    #[error("Checksum mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
