//! Retrying client: one backoff policy for every outbound call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::metrics;

use super::config::RetryPolicy;
use super::error::{AttemptFailure, HttpError, TransportError};
use super::traits::Transport;
use super::types::{BufferedResponse, HttpRequest, HttpResponse, Idempotency};

/// Wraps a [`Transport`] with bounded retry, exponential backoff and rate-limit handling.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Executes the request and buffers the body, retrying per policy.
    ///
    /// Reading the body gets its own `request.timeout`; a stalled body is a timeout fault.
    pub async fn execute(&self, request: &HttpRequest) -> Result<BufferedResponse, HttpError> {
        let timeout = request.timeout;
        self.execute_with(request, |response| read_body(response, timeout))
            .await
    }

    /// Executes the request and hands each accepted response to `handler`.
    ///
    /// A handler error counts as a transport fault for that attempt, so a body that
    /// fails halfway is requested again from the start.
    ///
    /// The backoff delay is shared by the rate-limit and generic-failure branches and
    /// keeps doubling for the whole call. A burst of 429s followed by a 5xx therefore
    /// waits longer than a lone 5xx would.
    pub async fn execute_with<T, F, Fut>(
        &self,
        request: &HttpRequest,
        mut handler: F,
    ) -> Result<T, HttpError>
    where
        F: FnMut(HttpResponse) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_delay();
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            let failure = match self.attempt(request).await {
                Ok(response) => match handler(response).await {
                    Ok(value) => return Ok(value),
                    Err(e) => AttemptFailure::Transport(e),
                },
                Err(failure) => failure,
            };

            if request.idempotency == Idempotency::NonIdempotent
                && matches!(failure, AttemptFailure::Transport(TransportError::Timeout))
            {
                error!(
                    method = %request.method,
                    url = %request.url,
                    "Request timed out; not retrying a non-idempotent call"
                );
                return Err(HttpError::Ambiguous {
                    method: request.method,
                    url: request.url.clone(),
                });
            }

            self.log_failure(request, &failure, attempt, max_attempts, delay);
            metrics::HTTP_RETRIES
                .with_label_values(&[failure.reason()])
                .inc();
            last_failure = Some(failure);

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
                delay = self.policy.next_delay(delay);
            }
        }

        Err(HttpError::Exhausted {
            method: request.method,
            url: request.url.clone(),
            attempts: max_attempts,
            last: last_failure.unwrap_or(AttemptFailure::Transport(TransportError::Request(
                "no attempt was made".to_string(),
            ))),
        })
    }

    /// One attempt: send under the per-call timeout and classify the status.
    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, AttemptFailure> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = match tokio::time::timeout(request.timeout, self.transport.send(request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(TransportError::Timeout.into()),
        };

        let status = response.status();
        if request.accept.accepts(status) {
            return Ok(response);
        }
        if status == 429 {
            return Err(AttemptFailure::RateLimited);
        }

        // The body is only for the log line, so a failed read is not a separate fault.
        let body = match read_body(response, request.timeout).await {
            Ok(buffered) => buffered.text_excerpt(),
            Err(e) => format!("<body unavailable: {}>", e),
        };
        Err(AttemptFailure::Status { status, body })
    }

    fn log_failure(
        &self,
        request: &HttpRequest,
        failure: &AttemptFailure,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    ) {
        let retrying = attempt < max_attempts;
        match failure {
            AttemptFailure::RateLimited => warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "Rate limit hit{}",
                if retrying {
                    format!(", waiting {} seconds", delay.as_secs_f64())
                } else {
                    String::new()
                }
            ),
            other => error!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "Request failed (attempt {}/{}): {}",
                attempt,
                max_attempts,
                other
            ),
        }
    }
}

async fn read_body(
    response: HttpResponse,
    timeout: Duration,
) -> Result<BufferedResponse, TransportError> {
    tokio::time::timeout(timeout, response.into_bytes())
        .await
        .map_err(|_| TransportError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, Method};
    use crate::testing::{MockReply, MockTransport};
    use tokio::time::Instant;

    const URL: &str = "https://api.test/thing";

    fn client(transport: &Arc<MockTransport>, attempts: u32) -> RetryingClient {
        RetryingClient::new(
            Arc::clone(transport) as Arc<dyn Transport>,
            RetryPolicy::default().with_max_attempts(attempts),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::json(200, serde_json::json!({"ok": true})));

        let response = client(&transport, 3)
            .execute(&HttpRequest::get(URL))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.count(Method::Get, URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_rate_limited_exhausts_ceiling_with_doubling_waits() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::status(429));

        let start = Instant::now();
        let err = client(&transport, 3)
            .execute(&HttpRequest::get(URL))
            .await
            .unwrap_err();

        assert_eq!(transport.count(Method::Get, URL), 3);
        // Waits of 2s and 4s between the three attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        match err {
            HttpError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, AttemptFailure::RateLimited));
            }
            other => panic!("Expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_times_are_spaced_by_backoff() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::status(429));

        let _ = client(&transport, 4).execute(&HttpRequest::get(URL)).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<u64> = calls
            .windows(2)
            .map(|w| (w[1].at - w[0].at).as_secs())
            .collect();
        assert_eq!(gaps, vec![2, 4, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success_recovers() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Get,
            URL,
            vec![
                MockReply::status(429),
                MockReply::json(200, serde_json::json!({"status": "active"})),
            ],
        );

        let response = client(&transport, 3)
            .execute(&HttpRequest::get(URL))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.count(Method::Get, URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_shared_between_rate_limit_and_server_errors() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Get,
            URL,
            vec![
                MockReply::status(429),
                MockReply::status(503),
                MockReply::status(200),
            ],
        );

        let start = Instant::now();
        client(&transport, 3)
            .execute(&HttpRequest::get(URL))
            .await
            .unwrap();

        // 2s after the 429, then 4s (not a reset 2s) after the 503.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unaccepted_status_is_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Post,
            URL,
            vec![MockReply::status(200), MockReply::status(202)],
        );

        let response = client(&transport, 3)
            .execute(&HttpRequest::post(URL).accepting(&[202, 204]))
            .await
            .unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(transport.count(Method::Post, URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out_and_is_retried_when_idempotent() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Get,
            URL,
            vec![MockReply::Hang, MockReply::status(200)],
        );

        let start = Instant::now();
        let request = HttpRequest::get(URL).with_timeout(Duration::from_secs(30));
        client(&transport, 3).execute(&request).await.unwrap();

        assert_eq!(transport.count(Method::Get, URL), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_body_times_out_and_is_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Get,
            URL,
            vec![
                MockReply::stall(200, "{\"status\":"),
                MockReply::json(200, serde_json::json!({"status": "active"})),
            ],
        );

        let start = Instant::now();
        let request = HttpRequest::get(URL).with_timeout(Duration::from_secs(30));
        let response = client(&transport, 3).execute(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.count(Method::Get, URL), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_error_body_does_not_hang() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::stall(500, "partial"));

        let request = HttpRequest::get(URL).with_timeout(Duration::from_secs(30));
        let err = client(&transport, 2).execute(&request).await.unwrap_err();

        assert_eq!(transport.count(Method::Get, URL), 2);
        assert!(matches!(
            err.last_failure(),
            Some(AttemptFailure::Status { status: 500, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_idempotent_timeout_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Post, URL, MockReply::Hang);

        let request = HttpRequest::post(URL).non_idempotent();
        let err = client(&transport, 3).execute(&request).await.unwrap_err();

        assert!(matches!(err, HttpError::Ambiguous { .. }));
        assert_eq!(transport.count(Method::Post, URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_idempotent_connect_failure_is_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on_sequence(
            Method::Post,
            URL,
            vec![
                MockReply::Error(TransportError::Connect("refused".to_string())),
                MockReply::status(202),
            ],
        );

        let request = HttpRequest::post(URL).non_idempotent();
        let response = client(&transport, 3).execute(&request).await.unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(transport.count(Method::Post, URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_failure_restarts_request() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::status(200));

        let mut handler_calls = 0;
        let result: Result<(), HttpError> = client(&transport, 3)
            .execute_with(&HttpRequest::get(URL), |_response| {
                handler_calls += 1;
                let fail = handler_calls < 3;
                async move {
                    if fail {
                        Err(TransportError::Body("connection reset".to_string()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(handler_calls, 3);
        assert_eq!(transport.count(Method::Get, URL), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, URL, MockReply::status(500));

        let err = client(&transport, 0)
            .execute(&HttpRequest::get(URL))
            .await
            .unwrap_err();

        assert_eq!(transport.count(Method::Get, URL), 1);
        assert!(matches!(
            err.last_failure(),
            Some(AttemptFailure::Status { status: 500, .. })
        ));
    }
}
