//! Operational boundaries of the content client.
//!
//! Reading these constants should tell you how the client behaves by
//! default: how long it waits, how often it retries, how long it remembers.

use std::time::Duration;

// ---------------------------------------------------------------------------
// WordPress REST boundaries
// ---------------------------------------------------------------------------

/// Header carrying the total number of matching items.
pub const TOTAL_ITEMS_HEADER: &str = "X-WP-Total";

/// Header carrying the total number of result pages.
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// Largest `per_page` WordPress accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Post status requested unless the caller overrides it.
pub const DEFAULT_POST_STATUS: &str = "publish";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level retries after the first attempt, for connection failures.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for transport-level backoff (`delay * 2^attempt`).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// TCP connect timeout handed to reqwest.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum characters kept from an error body when it has no JSON shape.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// TTL for paginated collections; posts change more often than terms.
pub const DEFAULT_LIST_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for a single post.
pub const DEFAULT_SINGLE_TTL: Duration = Duration::from_secs(10 * 60);

/// TTL for categories, tags, authors and media.
pub const DEFAULT_STATIC_TTL: Duration = Duration::from_secs(30 * 60);

/// Maximum number of cached responses per client.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// How often the background sweeper purges expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Call-site retry
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
