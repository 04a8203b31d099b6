// src/error.rs
//! Error types with structured classification.
//!
//! `RequestError` is the vocabulary of everything that can go wrong between
//! a caller and the WordPress REST API. Each variant carries enough
//! structure (status, machine code, endpoint, retriability) for presentation
//! layers to pick their copy without inspecting message text.

use crate::types::ValidationError;
use std::fmt;
use thiserror::Error;

/// WordPress REST error codes as a typed vocabulary.
///
/// Known codes get their own variant, anything else is preserved verbatim
/// in `Unknown`. `Display` always yields the wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorCode {
    /// `rest_post_invalid_id`: no post with that id
    InvalidPostId,
    /// `rest_term_invalid`: no category/tag with that id
    InvalidTerm,
    /// `rest_user_invalid_id`: no author with that id
    InvalidUserId,
    /// `rest_no_route`: the path does not exist in this namespace
    NoRoute,
    /// `rest_invalid_param`: a query parameter was rejected
    InvalidParam,
    /// `rest_post_invalid_page_number`: page past the last one
    InvalidPageNumber,
    /// `rest_forbidden`: the resource is not publicly readable
    Forbidden,
    /// Synthetic: a filtered lookup matched nothing
    NotFound,
    /// Fallback when the error body is missing or unparseable
    HttpError,
    /// A code this client doesn't recognize yet
    Unknown(String),
}

impl RemoteErrorCode {
    /// Parse a WordPress error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rest_post_invalid_id" => Self::InvalidPostId,
            "rest_term_invalid" => Self::InvalidTerm,
            "rest_user_invalid_id" => Self::InvalidUserId,
            "rest_no_route" => Self::NoRoute,
            "rest_invalid_param" => Self::InvalidParam,
            "rest_post_invalid_page_number" => Self::InvalidPageNumber,
            "rest_forbidden" => Self::Forbidden,
            "NOT_FOUND" => Self::NotFound,
            "HTTP_ERROR" => Self::HttpError,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this code means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvalidPostId
                | Self::InvalidTerm
                | Self::InvalidUserId
                | Self::NoRoute
                | Self::NotFound
        )
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPostId => write!(f, "rest_post_invalid_id"),
            Self::InvalidTerm => write!(f, "rest_term_invalid"),
            Self::InvalidUserId => write!(f, "rest_user_invalid_id"),
            Self::NoRoute => write!(f, "rest_no_route"),
            Self::InvalidParam => write!(f, "rest_invalid_param"),
            Self::InvalidPageNumber => write!(f, "rest_post_invalid_page_number"),
            Self::Forbidden => write!(f, "rest_forbidden"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::HttpError => write!(f, "HTTP_ERROR"),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Coarse classification for deciding what to tell a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    Network,
    NotFound,
    Unauthorized,
    RateLimited,
    Server,
    Client,
    InvalidResponse,
    Cancelled,
}

/// Everything that can fail on the way to (and back from) the content API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("Network failure for {endpoint} after {attempts} attempt(s): {message}")]
    NetworkFailure {
        endpoint: String,
        message: String,
        attempts: u32,
    },

    #[error("{endpoint} returned {status} ({code}): {message}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        code: RemoteErrorCode,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Request to {endpoint} was cancelled")]
    Cancelled { endpoint: String },
}

impl RequestError {
    /// Builds the "nothing matched" error used by slug lookups.
    ///
    /// No HTTP 404 happened; the shape matches one so callers handle a
    /// missing resource the same way regardless of how it was looked up.
    pub fn not_found(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status: 404,
            code: RemoteErrorCode::NotFound,
            message: message.into(),
        }
    }

    /// Numeric status: the HTTP status, 408 for timeouts, 0 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 408,
            Self::HttpStatus { status, .. } => *status,
            _ => 0,
        }
    }

    /// Machine-readable code.
    pub fn code(&self) -> String {
        match self {
            Self::Timeout { .. } => "TIMEOUT".to_string(),
            Self::NetworkFailure { .. } => "NETWORK_ERROR".to_string(),
            Self::HttpStatus { code, .. } => code.to_string(),
            Self::InvalidResponse { .. } => "INVALID_RESPONSE".to_string(),
            Self::Validation(_) => "VALIDATION_ERROR".to_string(),
            Self::Cancelled { .. } => "CANCELLED".to_string(),
        }
    }

    /// The endpoint that was attempted.
    ///
    /// Empty for validation errors, where no request was built, and for
    /// calls abandoned through `RetryOrchestrator::reset`, which does not
    /// know what the operation was requesting.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Timeout { endpoint, .. }
            | Self::NetworkFailure { endpoint, .. }
            | Self::HttpStatus { endpoint, .. }
            | Self::InvalidResponse { endpoint, .. }
            | Self::Cancelled { endpoint } => endpoint,
            Self::Validation(_) => "",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NetworkFailure { .. } => ErrorKind::Network,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::HttpStatus { status, code, .. } => match status {
                404 => ErrorKind::NotFound,
                _ if code.is_not_found() => ErrorKind::NotFound,
                401 | 403 => ErrorKind::Unauthorized,
                429 => ErrorKind::RateLimited,
                500..=599 => ErrorKind::Server,
                _ => ErrorKind::Client,
            },
        }
    }

    /// Whether this error is transient and worth retrying at the call site.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::NetworkFailure { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::InvalidResponse { .. } | Self::Validation(_) | Self::Cancelled { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Application-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfiguration { key: &'static str, reason: String },

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
