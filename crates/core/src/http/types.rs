//! Request and response types shared by every transport.

use std::fmt;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;

use super::error::TransportError;

/// Streaming response body.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Default per-call timeout for status and activation calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether repeating a request is safe when its outcome is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Repeating the request has no additional effect. Every failure is retried.
    Idempotent,
    /// A timed-out attempt may have been applied, so it is not retried.
    NonIdempotent,
}

/// Which response statuses count as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptStatus {
    /// Any 2xx status.
    Success,
    /// Only the listed statuses.
    Only(Vec<u16>),
}

impl AcceptStatus {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            AcceptStatus::Success => (200..300).contains(&status),
            AcceptStatus::Only(allowed) => allowed.contains(&status),
        }
    }
}

/// An outbound request description, independent of the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
    pub accept: AcceptStatus,
    pub idempotency: Idempotency,
    /// Send provider credentials. Disabled for pre-signed download locations.
    pub authenticated: bool,
}

impl HttpRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            accept: AcceptStatus::Success,
            idempotency: Idempotency::Idempotent,
            authenticated: true,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Attaches a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts success to the given statuses.
    pub fn accepting(mut self, statuses: &[u16]) -> Self {
        self.accept = AcceptStatus::Only(statuses.to_vec());
        self
    }

    /// Marks the request as not safe to repeat after a timeout.
    pub fn non_idempotent(mut self) -> Self {
        self.idempotency = Idempotency::NonIdempotent;
        self
    }

    /// Sends the request without provider credentials.
    pub fn without_auth(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    status: u16,
    body: BodyStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body", &"<stream>")
            .finish()
    }
}

impl HttpResponse {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Creates a response with a fully known body.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(status, stream::once(async move { Ok(body) }).boxed())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Reads the whole body into memory.
    pub async fn into_bytes(self) -> Result<BufferedResponse, TransportError> {
        let status = self.status;
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(BufferedResponse {
            status,
            body: buf.freeze(),
        })
    }
}

/// A response with its body read into memory.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    pub status: u16,
    pub body: Bytes,
}

impl BufferedResponse {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns the body as text, truncated for log output.
    pub fn text_excerpt(&self) -> String {
        String::from_utf8_lossy(&self.body).chars().take(200).collect()
    }
}
