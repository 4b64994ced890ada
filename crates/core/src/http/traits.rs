//! Transport seam underneath the retrying client.

use async_trait::async_trait;

use super::error::TransportError;
use super::types::{HttpRequest, HttpResponse};

/// Sends one request and returns the raw response.
///
/// Implementations make exactly one attempt. Status interpretation, timeouts and
/// retries belong to [`RetryingClient`](super::RetryingClient).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
