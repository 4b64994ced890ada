use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::http::{HttpRequest, HttpResponse, RetryingClient, TransportError};
use crate::ledger::AssetKey;
use crate::metrics;
use crate::provider::ProviderClient;

use super::config::DownloadConfig;
use super::error::DownloadError;

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
    /// Whether a provider digest was available and matched.
    pub checksum_verified: bool,
}

/// Bytes and digest of one fully written body.
struct Transferred {
    bytes: u64,
    md5: String,
}

/// Streams active assets to disk.
#[derive(Clone)]
pub struct AssetDownloader {
    http: RetryingClient,
    provider: ProviderClient,
    config: DownloadConfig,
    timeout: Duration,
}

impl AssetDownloader {
    /// `timeout` bounds both the wait for the response and any gap between body chunks.
    pub fn new(
        http: RetryingClient,
        provider: ProviderClient,
        config: DownloadConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            provider,
            config,
            timeout,
        }
    }

    /// Downloads the asset behind `self_link` to `dest`.
    ///
    /// The status is re-read first: the asset must be `active` and carry a location.
    /// Nothing is written to `dest` unless the whole body arrived (and matched the
    /// provider digest, when verification is on).
    pub async fn download(
        &self,
        key: &AssetKey,
        self_link: &str,
        dest: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let status = self
            .provider
            .asset_status(self_link)
            .await
            .map_err(|source| DownloadError::StatusCheckFailed {
                key: key.to_string(),
                source,
            })?;

        if !status.is_active() {
            warn!(key = %key, status = %status.status, "Asset not ready for download");
            return Err(DownloadError::NotReady {
                key: key.to_string(),
                status: status.status,
            });
        }
        let location = status
            .location
            .as_deref()
            .ok_or_else(|| DownloadError::MissingLocation {
                key: key.to_string(),
            })?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        info!(key = %key, path = %dest.display(), "Downloading asset");
        let started = Instant::now();
        let part = part_path(dest);

        // Signed locations carry their own credentials.
        let request = HttpRequest::get(location)
            .with_timeout(self.timeout)
            .accepting(&[200])
            .without_auth();
        let chunk_size = self.config.chunk_size;
        let idle = self.timeout;

        let transferred = self
            .http
            .execute_with(&request, |response| {
                let part = part.clone();
                async move { write_body(response, &part, chunk_size, idle).await }
            })
            .await;

        let transferred = match transferred {
            Ok(t) => t,
            Err(source) => {
                remove_partial(&part).await;
                self.record(started, "failed");
                return Err(DownloadError::TransferFailed {
                    key: key.to_string(),
                    source,
                });
            }
        };

        let mut checksum_verified = false;
        if self.config.verify_checksum {
            if let Some(expected) = status.md5_digest.as_deref() {
                if !expected.eq_ignore_ascii_case(&transferred.md5) {
                    remove_partial(&part).await;
                    self.record(started, "checksum_mismatch");
                    return Err(DownloadError::ChecksumMismatch {
                        key: key.to_string(),
                        expected: expected.to_string(),
                        actual: transferred.md5,
                    });
                }
                checksum_verified = true;
            }
        }

        if let Err(source) = fs::rename(&part, dest).await {
            remove_partial(&part).await;
            self.record(started, "failed");
            return Err(DownloadError::Io {
                path: dest.to_path_buf(),
                source,
            });
        }

        self.record(started, "success");
        metrics::DOWNLOAD_BYTES.inc_by(transferred.bytes);
        info!(
            key = %key,
            path = %dest.display(),
            bytes = transferred.bytes,
            checksum_verified,
            "Successfully downloaded asset"
        );

        Ok(DownloadOutcome {
            path: dest.to_path_buf(),
            bytes: transferred.bytes,
            checksum_verified,
        })
    }

    fn record(&self, started: Instant, result: &str) {
        metrics::DOWNLOADS.with_label_values(&[result]).inc();
        metrics::DOWNLOAD_DURATION
            .with_label_values(&[result])
            .observe(started.elapsed().as_secs_f64());
    }
}

/// `{dest}.part`
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn remove_partial(part: &Path) {
    if let Err(e) = fs::remove_file(part).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %part.display(), error = %e, "Failed to remove partial download");
        }
    }
}

/// Streams one response body into `part`, truncating whatever a previous attempt left.
async fn write_body(
    response: HttpResponse,
    part: &Path,
    chunk_size: usize,
    idle: Duration,
) -> Result<Transferred, TransportError> {
    let io_err = |e: std::io::Error| TransportError::Io(format!("{}: {}", part.display(), e));

    let file = fs::File::create(part).await.map_err(io_err)?;
    let mut writer = BufWriter::with_capacity(chunk_size.max(1), file);
    let mut body = response.into_body();
    let mut digest = md5::Context::new();
    let mut bytes = 0u64;

    loop {
        let chunk = match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(chunk)) => chunk?,
            Ok(None) => break,
            Err(_) => return Err(TransportError::Timeout),
        };
        digest.consume(&chunk);
        bytes += chunk.len() as u64;
        writer.write_all(&chunk).await.map_err(io_err)?;
    }

    writer.flush().await.map_err(io_err)?;
    writer.get_ref().sync_all().await.map_err(io_err)?;

    Ok(Transferred {
        bytes,
        md5: format!("{:x}", digest.compute()),
    })
}
