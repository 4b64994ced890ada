//! Asset downloader.
//!
//! Re-checks the asset status, streams the file behind the reported location to
//! `{dest}.part`, verifies the MD5 digest when one is reported, and renames the
//! partial file into place. A failed download leaves no file at `dest`.

mod asset_downloader;
mod config;
mod error;

pub use asset_downloader::{AssetDownloader, DownloadOutcome};
pub use config::DownloadConfig;
pub use error::DownloadError;
