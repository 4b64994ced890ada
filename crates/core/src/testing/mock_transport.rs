//! Scripted transport for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tokio::time::Instant;

use crate::http::{HttpRequest, HttpResponse, Method, Transport, TransportError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A complete response.
    Respond { status: u16, body: Bytes },
    /// Sends the status and `prefix`, then never finishes the body.
    Stall { status: u16, prefix: Bytes },
    /// Never answers.
    Hang,
    /// Fails below the HTTP layer.
    Error(TransportError),
}

impl MockReply {
    pub fn status(status: u16) -> Self {
        Self::Respond {
            status,
            body: Bytes::new(),
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::Respond {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn bytes(status: u16, body: impl AsRef<[u8]>) -> Self {
        Self::Respond {
            status,
            body: Bytes::copy_from_slice(body.as_ref()),
        }
    }

    pub fn stall(status: u16, prefix: impl AsRef<[u8]>) -> Self {
        Self::Stall {
            status,
            prefix: Bytes::copy_from_slice(prefix.as_ref()),
        }
    }
}

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub authenticated: bool,
    /// Clock reading when the request arrived (paused-clock aware).
    pub at: Instant,
}

/// Mock implementation of the Transport trait.
///
/// Replies are scripted per (method, URL). A scripted sequence is consumed in order and
/// its last reply repeats. Unscripted routes answer 404.
///
/// # Example
///
/// ```rust,ignore
/// use scenefetch_core::http::Method;
/// use scenefetch_core::testing::{MockReply, MockTransport};
///
/// let transport = MockTransport::new();
/// transport.on_sequence(
///     Method::Get,
///     "https://api.test/status",
///     vec![MockReply::status(429), MockReply::status(200)],
/// );
///
/// // ... run code under test ...
///
/// assert_eq!(transport.count(Method::Get, "https://api.test/status"), 2);
/// ```
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `method url` with `reply`.
    pub fn on(&self, method: Method, url: &str, reply: MockReply) {
        self.on_sequence(method, url, vec![reply]);
    }

    /// Answer `method url` with `replies` in order, repeating the last one.
    pub fn on_sequence(&self, method: Method, url: &str, replies: Vec<MockReply>) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, url.to_string()), replies.into());
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests received for `method url`.
    pub fn count(&self, method: Method, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    /// Forgets recorded calls; scripted routes are kept.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn next_reply(&self, method: Method, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().unwrap();
        let replies = routes.get_mut(&(method, url.to_string()))?;
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            url: request.url.clone(),
            body: request.body.clone(),
            authenticated: request.authenticated,
            at: Instant::now(),
        });

        match self.next_reply(request.method, &request.url) {
            None => Ok(HttpResponse::from_bytes(404, Bytes::from_static(b"not found"))),
            Some(MockReply::Respond { status, body }) => Ok(HttpResponse::from_bytes(status, body)),
            Some(MockReply::Stall { status, prefix }) => {
                let body = stream::once(async move { Ok(prefix) })
                    .chain(stream::pending())
                    .boxed();
                Ok(HttpResponse::new(status, body))
            }
            Some(MockReply::Hang) => std::future::pending().await,
            Some(MockReply::Error(e)) => Err(e),
        }
    }
}
