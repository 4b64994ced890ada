//! Error types for outbound HTTP calls.

use thiserror::Error;

use super::types::Method;

/// A single attempt failed below the HTTP status layer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("I/O error while handling response: {0}")]
    Io(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Why one attempt inside the retry loop failed.
#[derive(Debug, Clone, Error)]
pub enum AttemptFailure {
    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AttemptFailure {
    /// Label used for retry metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Status { .. } => "status",
            Self::Transport(TransportError::Timeout) => "timeout",
            Self::Transport(_) => "transport",
        }
    }
}

/// Terminal outcome of a retried call.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("{method} {url} failed after {attempts} attempts: {last}")]
    Exhausted {
        method: Method,
        url: String,
        attempts: u32,
        last: AttemptFailure,
    },

    #[error("{method} {url} timed out and was not retried because it is not idempotent")]
    Ambiguous { method: Method, url: String },
}

impl HttpError {
    /// The final attempt's failure, if the call ran out of attempts.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::Ambiguous { .. } => None,
        }
    }
}
