//! Outbound HTTP with a single retry/backoff policy.
//!
//! Every network call made by the activator, the downloader, the provider client and
//! the search adapter goes through [`RetryingClient`]:
//!
//! - Up to `max_attempts` attempts per call (default 3)
//! - HTTP 429 waits the current delay, doubles it, and retries; the attempt still counts
//! - Any other unaccepted status or transport fault waits, doubles and retries the same way
//! - Per-call timeouts count as transport faults
//! - Timed-out non-idempotent calls are not repeated
//! - Exhaustion is returned as [`HttpError`], never a panic

mod config;
mod error;
mod reqwest_transport;
mod retry;
mod traits;
mod types;

pub use config::{RetryPolicy, TimeoutConfig};
pub use error::{AttemptFailure, HttpError, TransportError};
pub use reqwest_transport::ReqwestTransport;
pub use retry::RetryingClient;
pub use traits::Transport;
pub use types::{
    AcceptStatus, BodyStream, BufferedResponse, HttpRequest, HttpResponse, Idempotency, Method,
    DEFAULT_REQUEST_TIMEOUT,
};
