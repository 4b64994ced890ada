//! reqwest-backed transport with provider basic auth.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use super::error::TransportError;
use super::traits::Transport;
use super::types::{HttpRequest, HttpResponse, Method};

/// Production transport.
///
/// Authenticated requests use HTTP basic auth with the API key as the user name and an
/// empty password. Timeouts are applied by the retrying client, not here.
pub struct ReqwestTransport {
    client: Client,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(api_key: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("scenefetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if request.authenticated {
            builder = builder.basic_auth(&self.api_key, Some(""));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(HttpResponse::new(status, body))
    }
}
