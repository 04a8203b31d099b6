// src/lib.rs
//! wp-content library: typed, cached, retrying access to a WordPress site's
//! REST API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `RequestError`, `ErrorKind`, `AppError`, `ValidationError`
//! - **Configuration**: `ClientConfig`, `CacheTtls`, `TtlClass`
//! - **Domain model**: `Post`, `Category`, `Tag`, `Author`, `Media`, `Page`
//! - **Domain types**: `PostId`, `CategoryId`, `Slug`, `ApiBaseUrl`, etc.
//! - **API client**: `WordPressClient`, `RequestExecutor`, `TtlCache`, `Transport`
//! - **Retry**: `RetryOrchestrator`, `RetryOptions`, `RetryState`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod model;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorKind, RemoteErrorCode, RequestError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CacheTtls, ClientConfig, TtlClass};

// --- Domain Model ---
pub use crate::model::{Author, Category, Embedded, Media, Page, Post, Rendered, Tag, Term};

// --- Domain Types ---
pub use crate::types::{
    ApiBaseUrl, AuthorId, CategoryId, MediaId, PostId, ResourceId, SearchTerm, Slug, TagId,
};

// --- API Client ---
pub use crate::api::{
    ApiResponse, ContentRepository, PostFilter, QueryParams, RawResponse, RequestExecutor,
    ReqwestTransport, TermFilter, Transport, TransportConfig, TransportError,
    TransportErrorKind, TransportPolicy, TtlCache, WordPressClient,
};

// --- Retry ---
pub use crate::error_recovery::{RetryClassify, RetryOptions, RetryOrchestrator, RetryState};
