// src/api/mod.rs
//! WordPress REST API interaction.
//!
//! Layered from the bottom up: a raw `Transport`, the `RequestExecutor`
//! that adds timeouts, backoff and classification, a TTL cache, and the
//! typed `WordPressClient` on top.

pub mod cache;
pub mod client;
pub mod parser;
pub mod query;
pub mod transport;
pub mod wordpress;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::RequestError;
use crate::model::{Author, Category, Page, Post, Tag};

/// The ability to read published content from a site.
///
/// Front ends depend on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    async fn posts(&self, filter: &PostFilter) -> Result<Page<Post>, RequestError>;
    async fn post(&self, id: i64) -> Result<Post, RequestError>;
    async fn post_by_slug(&self, slug: &str) -> Result<Post, RequestError>;
    async fn search(&self, term: &str, filter: &PostFilter) -> Result<Page<Post>, RequestError>;
    async fn categories(&self) -> Result<Vec<Category>, RequestError>;
    async fn tags(&self) -> Result<Vec<Tag>, RequestError>;
    async fn authors(&self) -> Result<Vec<Author>, RequestError>;

    /// Resolves a post from either a numeric id or a slug.
    async fn resolve_post(&self, id_or_slug: &str) -> Result<Post, RequestError> {
        match id_or_slug.trim().parse::<i64>() {
            Ok(id) => self.post(id).await,
            Err(_) => self.post_by_slug(id_or_slug).await,
        }
    }
}

#[async_trait::async_trait]
impl ContentRepository for WordPressClient {
    async fn posts(&self, filter: &PostFilter) -> Result<Page<Post>, RequestError> {
        self.list_posts(filter).await
    }

    async fn post(&self, id: i64) -> Result<Post, RequestError> {
        self.get_post(id).await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Post, RequestError> {
        self.get_post_by_slug(slug).await
    }

    async fn search(&self, term: &str, filter: &PostFilter) -> Result<Page<Post>, RequestError> {
        self.search_posts(term, filter).await
    }

    async fn categories(&self) -> Result<Vec<Category>, RequestError> {
        self.list_categories(&TermFilter::default()).await
    }

    async fn tags(&self) -> Result<Vec<Tag>, RequestError> {
        self.list_tags(&TermFilter::default()).await
    }

    async fn authors(&self) -> Result<Vec<Author>, RequestError> {
        self.list_authors().await
    }
}

// Re-export the public interface
pub use cache::{SweepHandle, TtlCache};
pub use client::{ApiResponse, RequestExecutor, TransportPolicy};
pub use query::{QueryParams, QueryValue};
pub use transport::{
    RawResponse, ReqwestTransport, Transport, TransportConfig, TransportError,
    TransportErrorKind,
};
pub use wordpress::{PostFilter, TermFilter, WordPressClient};
