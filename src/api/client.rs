// src/api/client.rs
//! Policy layer over the raw transport.
//!
//! `RequestExecutor` turns one logical GET into at most
//! `1 + retry_attempts` transport calls. Each attempt gets its own timeout
//! window. Only connection-level failures are retried, with exponential
//! backoff; timeouts and HTTP error statuses are returned at once.

use super::parser;
use super::query::QueryParams;
use super::transport::{RawResponse, Transport, TransportError, TransportErrorKind};
use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use crate::error::RequestError;
use crate::types::ApiBaseUrl;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A validated successful response with its pagination metadata.
///
/// This is also what the client caches; hits are decoded again by the
/// same parsers used for live responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub body: Value,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

/// Timeout and transport-level retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Applied to each attempt separately.
    pub timeout: Duration,
    /// Retries after the first attempt, for connection failures only.
    pub retry_attempts: u32,
    /// Base delay; attempt `n` (from 0) waits `retry_delay * 2^n`.
    pub retry_delay: Duration,
}

impl TransportPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

enum AttemptFailure {
    Timeout,
    Cancelled,
    Transport(TransportError),
}

/// Executes GET requests against the content API with timeout and backoff.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    base_url: ApiBaseUrl,
    policy: TransportPolicy,
    shutdown: CancellationToken,
}

impl RequestExecutor {
    /// `shutdown` aborts in-flight attempts and pending backoff waits.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: ApiBaseUrl,
        policy: TransportPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            transport,
            base_url,
            policy,
            shutdown,
        }
    }

    pub fn policy(&self) -> &TransportPolicy {
        &self.policy
    }

    pub fn base_url(&self) -> &ApiBaseUrl {
        &self.base_url
    }

    /// Performs one logical request to `path` with `query`.
    pub async fn execute(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> Result<ApiResponse, RequestError> {
        let endpoint = describe_endpoint(path, query);
        let mut url = self.base_url.endpoint(path)?;
        if !query.is_empty() {
            url.set_query(Some(&query.to_query_string()));
        }

        let mut attempt = 0u32;
        loop {
            if self.shutdown.is_cancelled() {
                return Err(RequestError::Cancelled { endpoint });
            }

            match self.attempt(&url).await {
                Ok(raw) => {
                    // The caller may have gone away while the response was in flight.
                    if self.shutdown.is_cancelled() {
                        return Err(RequestError::Cancelled { endpoint });
                    }
                    return classify_response(&endpoint, raw);
                }
                Err(AttemptFailure::Timeout) => {
                    log::warn!(
                        "{} timed out after {:?}; not retrying",
                        endpoint,
                        self.policy.timeout
                    );
                    return Err(RequestError::Timeout {
                        endpoint,
                        timeout_ms: self.policy.timeout.as_millis() as u64,
                    });
                }
                Err(AttemptFailure::Cancelled) => {
                    return Err(RequestError::Cancelled { endpoint });
                }
                Err(AttemptFailure::Transport(err)) if attempt < self.policy.retry_attempts => {
                    let delay = self.policy.backoff(attempt);
                    log::warn!(
                        "Attempt {} for {} failed ({}), retrying after {:?}",
                        attempt + 1,
                        endpoint,
                        err,
                        delay
                    );
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => {
                            return Err(RequestError::Cancelled { endpoint });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(AttemptFailure::Transport(err)) => {
                    log::error!(
                        "{} failed after {} attempt(s): {}",
                        endpoint,
                        attempt + 1,
                        err
                    );
                    return Err(RequestError::NetworkFailure {
                        endpoint,
                        message: err.message,
                        attempts: attempt + 1,
                    });
                }
            }
        }
    }

    async fn attempt(&self, url: &Url) -> Result<RawResponse, AttemptFailure> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(AttemptFailure::Cancelled),
            result = tokio::time::timeout(self.policy.timeout, self.transport.get(url)) => {
                match result {
                    Err(_elapsed) => Err(AttemptFailure::Timeout),
                    Ok(Err(err)) if err.kind == TransportErrorKind::Timeout => {
                        Err(AttemptFailure::Timeout)
                    }
                    Ok(Err(err)) => Err(AttemptFailure::Transport(err)),
                    Ok(Ok(raw)) => Ok(raw),
                }
            }
        }
    }
}

fn classify_response(endpoint: &str, raw: RawResponse) -> Result<ApiResponse, RequestError> {
    if !raw.status.is_success() {
        return Err(parser::parse_error_response(endpoint, raw.status, &raw.body));
    }

    let body = parser::parse_success_body(endpoint, &raw.body)?;
    let (total, total_pages) = parser::pagination_from_headers(&raw.headers);
    Ok(ApiResponse {
        body,
        total,
        total_pages,
    })
}

/// `posts?page=1&per_page=10`, used in logs and error reports.
pub fn describe_endpoint(path: &str, query: &QueryParams) -> String {
    let path = path.trim_start_matches('/');
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ScriptedTransport, Step};
    use crate::error::{ErrorKind, RemoteErrorCode};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    fn executor(transport: &Arc<ScriptedTransport>, policy: TransportPolicy) -> RequestExecutor {
        RequestExecutor::new(
            transport.clone(),
            ApiBaseUrl::parse("https://cms.example.com/wp-json/wp/v2").unwrap(),
            policy,
            CancellationToken::new(),
        )
    }

    fn policy(retry_attempts: u32, retry_delay_ms: u64) -> TransportPolicy {
        TransportPolicy {
            timeout: Duration::from_secs(10),
            retry_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let p = policy(3, 100);
        assert_eq!(p.backoff(0), Duration::from_millis(100));
        assert_eq!(p.backoff(1), Duration::from_millis(200));
        assert_eq!(p.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_failures_back_off_exponentially_then_give_up() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Fail(
            TransportError::connect("connection refused"),
        )]));
        let exec = executor(&transport, policy(2, 100));

        let err = exec.execute("posts", &QueryParams::new()).await.unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert_eq!(
            transport.gaps(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
        match err {
            RequestError::NetworkFailure {
                attempts, message, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(message, "connection refused");
            }
            other => panic!("expected NetworkFailure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_never_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Hang]));
        let mut p = policy(3, 100);
        p.timeout = Duration::from_secs(5);
        let exec = executor(&transport, p);

        let err = exec.execute("posts", &QueryParams::new()).await.unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.status(), 408);
        assert_eq!(
            err,
            RequestError::Timeout {
                endpoint: "posts".into(),
                timeout_ms: 5000
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_reported_timeouts_are_not_retried_either() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Fail(
            TransportError::new(TransportErrorKind::Timeout, "operation timed out"),
        )]));
        let exec = executor(&transport, policy(3, 100));

        let err = exec.execute("posts", &QueryParams::new()).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn http_errors_are_not_retried() {
        let body = r#"{"code":"rest_no_route","message":"No route was found","data":{"status":404}}"#;
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(
            RawResponse::new(StatusCode::NOT_FOUND, body),
        )]));
        let exec = executor(&transport, policy(3, 100));

        let err = exec.execute("nope", &QueryParams::new()).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        match err {
            RequestError::HttpStatus { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code, RemoteErrorCode::NoRoute);
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Fail(TransportError::connect("reset")),
            Step::Fail(TransportError::connect("reset")),
            Step::Respond(
                RawResponse::new(StatusCode::OK, r#"[{"id":1}]"#)
                    .with_header("X-WP-Total", "1")
                    .with_header("X-WP-TotalPages", "1"),
            ),
        ]));
        let exec = executor(&transport, policy(3, 100));

        let response = exec
            .execute("posts", &QueryParams::new().with("page", 1u32))
            .await
            .unwrap();
        assert_eq!(transport.calls(), 3);
        assert_eq!(response.total, Some(1));
        assert_eq!(response.total_pages, Some(1));
        assert_eq!(
            transport.last_url().as_deref(),
            Some("https://cms.example.com/wp-json/wp/v2/posts?page=1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn null_success_body_is_invalid() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(
            RawResponse::new(StatusCode::OK, "null"),
        )]));
        let exec = executor(&transport, policy(0, 0));

        let err = exec.execute("posts/1", &QueryParams::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.endpoint(), "posts/1");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_backoff_wait() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Fail(
            TransportError::connect("refused"),
        )]));
        let shutdown = CancellationToken::new();
        let exec = RequestExecutor::new(
            transport.clone(),
            ApiBaseUrl::parse("https://cms.example.com/wp-json/wp/v2").unwrap(),
            policy(5, 60_000),
            shutdown.clone(),
        );

        let task = tokio::spawn(async move { exec.execute("posts", &QueryParams::new()).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn describes_endpoints_with_canonical_query() {
        let q = QueryParams::new().with("per_page", 5u32).with("page", 2u32);
        assert_eq!(describe_endpoint("/posts", &q), "posts?page=2&per_page=5");
        assert_eq!(describe_endpoint("users/3", &QueryParams::new()), "users/3");
    }
}
