//! Drives one asset from inactive to active.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::http::{HttpRequest, RetryingClient};
use crate::ledger::AssetKey;
use crate::metrics;
use crate::provider::ProviderClient;

use super::config::ActivationConfig;
use super::ActivationError;

/// Accepted activation responses: 202 while activating, 204 when already active.
const ACTIVATION_ACCEPTED: [u16; 2] = [202, 204];

/// Requests activation and waits for the provider to report the asset active.
///
/// Outcomes are returned to the caller; the activator never touches the ledger.
#[derive(Clone)]
pub struct AssetActivator {
    http: RetryingClient,
    provider: ProviderClient,
    config: ActivationConfig,
    request_timeout: Duration,
}

impl AssetActivator {
    pub fn new(
        http: RetryingClient,
        provider: ProviderClient,
        config: ActivationConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            provider,
            config,
            request_timeout,
        }
    }

    /// POSTs the activate link.
    ///
    /// Repeating an activation request is a no-op on the provider side, so the POST is
    /// retried like a safe call.
    pub async fn request_activation(
        &self,
        key: &AssetKey,
        activate_link: &str,
    ) -> Result<(), ActivationError> {
        info!(key = %key, url = %activate_link, "Requesting asset activation");

        let request = HttpRequest::post(activate_link)
            .with_timeout(self.request_timeout)
            .accepting(&ACTIVATION_ACCEPTED);

        match self.http.execute(&request).await {
            Ok(response) => {
                info!(key = %key, status = response.status, "Asset activation request successful");
                metrics::ACTIVATION_REQUESTS
                    .with_label_values(&["success"])
                    .inc();
                Ok(())
            }
            Err(e) => {
                metrics::ACTIVATION_REQUESTS
                    .with_label_values(&["failed"])
                    .inc();
                Err(ActivationError::RequestFailed(e))
            }
        }
    }

    /// Polls the self link until the asset is active.
    ///
    /// Fails when the poll timeout elapses or a status check exhausts its retries.
    /// Between checks this sleeps a fixed interval; there is no adaptive backoff.
    pub async fn poll_until_active(
        &self,
        key: &AssetKey,
        self_link: &str,
    ) -> Result<(), ActivationError> {
        info!(key = %key, "Waiting for asset activation");
        let timeout = self.config.poll_timeout();
        let started = Instant::now();

        loop {
            if started.elapsed() >= timeout {
                warn!(key = %key, "Asset activation timed out after {} seconds", timeout.as_secs());
                metrics::ACTIVATION_POLLS
                    .with_label_values(&["timed_out"])
                    .inc();
                return Err(ActivationError::TimedOut {
                    key: key.to_string(),
                    waited: timeout,
                });
            }

            let status = match self.provider.asset_status(self_link).await {
                Ok(status) => status,
                Err(e) => {
                    metrics::ACTIVATION_POLLS
                        .with_label_values(&["failed"])
                        .inc();
                    return Err(ActivationError::StatusCheckFailed(e));
                }
            };

            if status.is_active() {
                info!(key = %key, "Asset is now active and ready for download");
                metrics::ACTIVATION_POLLS
                    .with_label_values(&["active"])
                    .inc();
                return Ok(());
            }

            info!(key = %key, status = %status.status, "Asset not active yet, waiting");
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}
