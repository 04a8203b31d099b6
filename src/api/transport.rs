// src/api/transport.rs
//! Raw HTTP access to the content API.
//!
//! A `Transport` performs exactly one GET and reports what happened. It has
//! no opinion about timeouts, retries or status codes; the request executor
//! layers that policy on top.

use crate::constants::DEFAULT_CONNECT_TIMEOUT;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Why a request produced no response at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS, refused connection, TLS, reset before a response.
    Connect,
    /// The transport gave up waiting.
    Timeout,
    /// A response started but its body could not be read.
    Body,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// The ability to issue one GET against the content API.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// Connection settings for the reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// A thin wrapper around a reqwest `Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn create_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        log::debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        log::debug!("{} -> {}", url, status);
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
