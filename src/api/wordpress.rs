// src/api/wordpress.rs
//! Typed access to the WordPress REST API.
//!
//! `WordPressClient` validates arguments before any I/O, applies the default
//! query parameters, and routes every read through the shared
//! cached-or-fetch path with a TTL picked by how volatile the resource is.

use super::cache::{SweepHandle, TtlCache};
use super::client::{describe_endpoint, ApiResponse, RequestExecutor};
use super::parser;
use super::query::QueryParams;
use super::transport::{ReqwestTransport, Transport};
use crate::config::{CacheTtls, ClientConfig, TtlClass};
use crate::constants::{DEFAULT_PAGE_SIZE, DEFAULT_POST_STATUS, MAX_PAGE_SIZE};
use crate::error::{AppError, RequestError};
use crate::model::{Author, Category, Media, Page, Post, Tag};
use crate::types::{
    AuthorId, CategoryId, MediaId, PostId, SearchTerm, Slug, TagId, ValidationError,
};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Filters for post collections. Unset fields fall back to the defaults
/// (`status=publish`, `_embed`, page 1, 10 per page) or are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    pub status: Option<String>,
    /// Inline author, featured image and terms. Defaults to true.
    pub embed: Option<bool>,
    pub slug: Option<String>,
    pub orderby: Option<String>,
    pub order: Option<String>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn categories(mut self, ids: impl Into<Vec<u64>>) -> Self {
        self.categories = ids.into();
        self
    }

    pub fn tags(mut self, ids: impl Into<Vec<u64>>) -> Self {
        self.tags = ids.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn embed(mut self, embed: bool) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn ordered_by(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.orderby = Some(field.into());
        self.order = Some(order.into());
        self
    }

    /// The page this filter asks for.
    pub fn current_page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Validated query parameters with defaults applied.
    pub fn to_params(&self) -> Result<QueryParams, ValidationError> {
        let page = check_page(self.current_page())?;
        let per_page = check_page_size(self.per_page.unwrap_or(DEFAULT_PAGE_SIZE))?;

        let mut params = QueryParams::new()
            .with("page", page)
            .with("per_page", per_page)
            .with(
                "status",
                self.status.as_deref().unwrap_or(DEFAULT_POST_STATUS),
            )
            .with("categories", self.categories.as_slice())
            .with("tags", self.tags.as_slice());

        if self.embed.unwrap_or(true) {
            params.set("_embed", true);
        }
        params
            .set_opt("search", non_blank(&self.search))
            .set_opt("slug", non_blank(&self.slug))
            .set_opt("orderby", non_blank(&self.orderby))
            .set_opt("order", non_blank(&self.order));
        Ok(params)
    }
}

/// Filters for category and tag collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFilter {
    /// Defaults to the largest page WordPress serves.
    pub per_page: Option<u32>,
    pub hide_empty: Option<bool>,
    pub orderby: Option<String>,
    pub order: Option<String>,
    pub slug: Option<String>,
}

impl TermFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_empty(mut self, hide: bool) -> Self {
        self.hide_empty = Some(hide);
        self
    }

    pub fn ordered_by(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.orderby = Some(field.into());
        self.order = Some(order.into());
        self
    }

    pub fn to_params(&self) -> Result<QueryParams, ValidationError> {
        let per_page = check_page_size(self.per_page.unwrap_or(MAX_PAGE_SIZE))?;
        Ok(QueryParams::new()
            .with("per_page", per_page)
            .with_opt("hide_empty", self.hide_empty)
            .with_opt("orderby", non_blank(&self.orderby))
            .with_opt("order", non_blank(&self.order))
            .with_opt("slug", non_blank(&self.slug)))
    }
}

fn check_page(page: u32) -> Result<u32, ValidationError> {
    if page == 0 {
        return Err(ValidationError::OutOfBounds {
            field: "page",
            value: page,
            min: 1,
            max: u32::MAX,
        });
    }
    Ok(page)
}

fn check_page_size(per_page: u32) -> Result<u32, ValidationError> {
    if !(1..=MAX_PAGE_SIZE).contains(&per_page) {
        return Err(ValidationError::OutOfBounds {
            field: "per_page",
            value: per_page,
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }
    Ok(per_page)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

static SHARED: OnceCell<WordPressClient> = OnceCell::new();

/// Client for one WordPress site.
///
/// Owns its cache and the cache's sweeper. `dispose()` (or dropping the
/// client) stops the sweeper and aborts requests still in flight.
pub struct WordPressClient {
    executor: RequestExecutor,
    cache: Option<Arc<TtlCache<ApiResponse>>>,
    ttls: CacheTtls,
    shutdown: CancellationToken,
    _sweeper: Option<SweepHandle>,
}

impl WordPressClient {
    /// Builds a client over a reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let transport = ReqwestTransport::new(&config.http)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Builds a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let shutdown = CancellationToken::new();
        let executor = RequestExecutor::new(
            transport,
            config.base_url.clone(),
            config.transport,
            shutdown.child_token(),
        );

        let (cache, sweeper) = if config.cache_enabled {
            let cache = Arc::new(TtlCache::new(config.cache_capacity));
            let sweeper = cache.spawn_sweeper(config.sweep_interval, shutdown.child_token());
            (Some(cache), sweeper)
        } else {
            (None, None)
        };

        log::info!(
            "WordPress client for {} (cache {})",
            config.base_url,
            if cache.is_some() { "on" } else { "off" }
        );

        Self {
            executor,
            cache,
            ttls: config.cache_ttls,
            shutdown,
            _sweeper: sweeper,
        }
    }

    /// A process-wide client configured from the environment.
    ///
    /// Offered for convenience; nothing in this crate depends on it.
    pub fn shared() -> Result<&'static WordPressClient, AppError> {
        SHARED.get_or_try_init(|| ClientConfig::from_env().and_then(Self::new))
    }

    // ---------------------------------------------------------------
    // Posts
    // ---------------------------------------------------------------

    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Page<Post>, RequestError> {
        let params = filter.to_params()?;
        self.fetch_page("posts", &params, filter.current_page(), TtlClass::List)
            .await
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, RequestError> {
        let id = PostId::new(id)?;
        let params = QueryParams::new().with("_embed", true);
        self.fetch_cached(&format!("posts/{}", id), &params, TtlClass::Single)
            .await
    }

    /// Looks a post up by slug; no match is reported as a 404.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RequestError> {
        let slug = Slug::new(slug)?;
        let filter = PostFilter {
            slug: Some(slug.to_string()),
            ..PostFilter::default()
        };
        let params = filter.to_params()?;
        let posts: Vec<Post> = self.fetch_cached("posts", &params, TtlClass::Single).await?;
        first_match(posts, "posts", &params, "post", &slug)
    }

    pub async fn search_posts(
        &self,
        term: &str,
        filter: &PostFilter,
    ) -> Result<Page<Post>, RequestError> {
        let term = SearchTerm::new(term)?;
        let filter = PostFilter {
            search: Some(term.to_string()),
            ..filter.clone()
        };
        self.list_posts(&filter).await
    }

    pub async fn posts_by_category(
        &self,
        category: i64,
        filter: &PostFilter,
    ) -> Result<Page<Post>, RequestError> {
        let category = CategoryId::new(category)?;
        self.list_posts(&filter.clone().categories(vec![category.get()]))
            .await
    }

    pub async fn posts_by_tag(
        &self,
        tag: i64,
        filter: &PostFilter,
    ) -> Result<Page<Post>, RequestError> {
        let tag = TagId::new(tag)?;
        self.list_posts(&filter.clone().tags(vec![tag.get()])).await
    }

    // ---------------------------------------------------------------
    // Terms
    // ---------------------------------------------------------------

    pub async fn list_categories(
        &self,
        filter: &TermFilter,
    ) -> Result<Vec<Category>, RequestError> {
        self.fetch_cached("categories", &filter.to_params()?, TtlClass::Static)
            .await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, RequestError> {
        let slug = Slug::new(slug)?;
        let params = TermFilter {
            slug: Some(slug.to_string()),
            ..TermFilter::default()
        }
        .to_params()?;
        let categories: Vec<Category> = self
            .fetch_cached("categories", &params, TtlClass::Static)
            .await?;
        first_match(categories, "categories", &params, "category", &slug)
    }

    pub async fn list_tags(&self, filter: &TermFilter) -> Result<Vec<Tag>, RequestError> {
        self.fetch_cached("tags", &filter.to_params()?, TtlClass::Static)
            .await
    }

    pub async fn get_tag_by_slug(&self, slug: &str) -> Result<Tag, RequestError> {
        let slug = Slug::new(slug)?;
        let params = TermFilter {
            slug: Some(slug.to_string()),
            ..TermFilter::default()
        }
        .to_params()?;
        let tags: Vec<Tag> = self.fetch_cached("tags", &params, TtlClass::Static).await?;
        first_match(tags, "tags", &params, "tag", &slug)
    }

    // ---------------------------------------------------------------
    // Authors and media
    // ---------------------------------------------------------------

    pub async fn list_authors(&self) -> Result<Vec<Author>, RequestError> {
        let params = QueryParams::new().with("per_page", MAX_PAGE_SIZE);
        self.fetch_cached("users", &params, TtlClass::Static).await
    }

    pub async fn get_author(&self, id: i64) -> Result<Author, RequestError> {
        let id = AuthorId::new(id)?;
        self.fetch_cached(&format!("users/{}", id), &QueryParams::new(), TtlClass::Static)
            .await
    }

    pub async fn get_media(&self, id: i64) -> Result<Media, RequestError> {
        let id = MediaId::new(id)?;
        self.fetch_cached(&format!("media/{}", id), &QueryParams::new(), TtlClass::Static)
            .await
    }

    // ---------------------------------------------------------------
    // Shared paths
    // ---------------------------------------------------------------

    /// Cached-or-fetch for any endpoint, decoded as `T`.
    pub async fn fetch_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
        class: TtlClass,
    ) -> Result<T, RequestError> {
        self.fetch_decoded(path, params, class, |endpoint, response| {
            parser::decode(endpoint, response.body)
        })
        .await
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
        current_page: u32,
        class: TtlClass,
    ) -> Result<Page<T>, RequestError> {
        self.fetch_decoded(path, params, class, |endpoint, response| {
            parser::decode_page(endpoint, response, current_page)
        })
        .await
    }

    /// Serves from the cache or fetches, then decodes. A response is only
    /// stored once it has decoded successfully.
    async fn fetch_decoded<T, F>(
        &self,
        path: &str,
        params: &QueryParams,
        class: TtlClass,
        decode: F,
    ) -> Result<T, RequestError>
    where
        F: Fn(&str, ApiResponse) -> Result<T, RequestError>,
    {
        let endpoint = describe_endpoint(path, params);
        let key = params.cache_key(path);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                log::debug!("Cache hit: {}", key);
                return decode(&endpoint, hit);
            }
            log::debug!("Cache miss: {}", key);
        }

        let response = self.executor.execute(path, params).await?;
        let decoded = decode(&endpoint, response.clone())?;
        if let Some(cache) = &self.cache {
            cache.set(key, response, self.ttls.ttl(class));
        }
        Ok(decoded)
    }

    /// Fetches one post, bypassing the cache. Never fails; any error
    /// counts as unhealthy.
    pub async fn health_check(&self) -> bool {
        let params = QueryParams::new().with("per_page", 1u32);
        match self.executor.execute("posts", &params).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Health check failed [{}]: {}", err.code(), err);
                false
            }
        }
    }

    // ---------------------------------------------------------------
    // Cache control and lifecycle
    // ---------------------------------------------------------------

    /// Drops the cached response for one request, if any.
    pub fn invalidate(&self, path: &str, params: &QueryParams) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.delete(&params.cache_key(path)))
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    /// Stops the sweeper and aborts in-flight requests. Later calls fail
    /// with `Cancelled`.
    pub fn dispose(&self) {
        if !self.shutdown.is_cancelled() {
            log::info!("Disposing WordPress client for {}", self.executor.base_url());
            self.shutdown.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for WordPressClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn first_match<T>(
    items: Vec<T>,
    path: &str,
    params: &QueryParams,
    resource: &str,
    slug: &Slug,
) -> Result<T, RequestError> {
    items.into_iter().next().ok_or_else(|| {
        RequestError::not_found(
            describe_endpoint(path, params),
            format!("No {} found with slug '{}'", resource, slug),
        )
    })
}
