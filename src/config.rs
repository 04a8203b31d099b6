use crate::api::client::TransportPolicy;
use crate::api::transport::TransportConfig;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_LIST_TTL, DEFAULT_SINGLE_TTL, DEFAULT_STATIC_TTL,
    DEFAULT_SWEEP_INTERVAL,
};
use crate::error::AppError;
use crate::error_recovery::RetryOptions;
use crate::types::ApiBaseUrl;
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Used when neither the environment nor the command line names a site.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/wp-json/wp/v2";

pub const ENV_BASE_URL: &str = "WORDPRESS_API_URL";
pub const ENV_TIMEOUT_MS: &str = "WORDPRESS_API_TIMEOUT_MS";
pub const ENV_RETRY_ATTEMPTS: &str = "WORDPRESS_API_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "WORDPRESS_API_RETRY_DELAY_MS";
pub const ENV_CACHE: &str = "WORDPRESS_API_CACHE";

/// How volatile a resource is, which decides how long it stays cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Paginated post collections.
    List,
    /// A single post.
    Single,
    /// Categories, tags, authors, media.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub list: Duration,
    pub single: Duration,
    pub static_resource: Duration,
}

impl CacheTtls {
    pub fn ttl(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::List => self.list,
            TtlClass::Single => self.single,
            TtlClass::Static => self.static_resource,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            list: DEFAULT_LIST_TTL,
            single: DEFAULT_SINGLE_TTL,
            static_resource: DEFAULT_STATIC_TTL,
        }
    }
}

/// Everything a `WordPressClient` needs at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ApiBaseUrl,
    pub transport: TransportPolicy,
    pub http: TransportConfig,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttls: CacheTtls,
    pub sweep_interval: Duration,
}

impl ClientConfig {
    pub fn new(base_url: ApiBaseUrl) -> Self {
        Self {
            base_url,
            transport: TransportPolicy::default(),
            http: TransportConfig::default(),
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttls: CacheTtls::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Defaults overridden by `WORDPRESS_API_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match lookup(ENV_BASE_URL) {
            Some(url) => ApiBaseUrl::parse(&url)?,
            None => default_base_url()?,
        };
        let mut config = Self::new(base_url);

        if let Some(ms) = parse_env::<u64>(&lookup, ENV_TIMEOUT_MS)? {
            config.transport.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_env::<u32>(&lookup, ENV_RETRY_ATTEMPTS)? {
            config.transport.retry_attempts = attempts;
        }
        if let Some(ms) = parse_env::<u64>(&lookup, ENV_RETRY_DELAY_MS)? {
            config.transport.retry_delay = Duration::from_millis(ms);
        }
        if let Some(flag) = lookup(ENV_CACHE) {
            config.cache_enabled = parse_switch(ENV_CACHE, &flag)?;
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.transport.retry_attempts = attempts;
        self.transport.retry_delay = delay;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.cache_ttls = ttls;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(default_base_url().expect("Default base URL should be valid"))
    }
}

fn default_base_url() -> Result<ApiBaseUrl, AppError> {
    Ok(ApiBaseUrl::parse(DEFAULT_BASE_URL)?)
}

fn parse_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AppError::InvalidConfiguration {
                    key,
                    reason: format!("{:?}: {}", raw, e),
                })
        })
        .transpose()
}

fn parse_switch(key: &'static str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(AppError::InvalidConfiguration {
            key,
            reason: format!("expected on/off, got {:?}", other),
        }),
    }
}

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// REST namespace root, e.g. https://example.com/wp-json/wp/v2 (overrides WORDPRESS_API_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-attempt request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Transport-level retries for connection failures
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Base delay for transport-level backoff in milliseconds
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Call-site attempts for each command (the outer retry loop)
    #[arg(long, global = true, default_value_t = 3)]
    pub max_attempts: u32,

    /// Disable response caching
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List published posts
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        /// Restrict to category ids (repeatable)
        #[arg(long = "category")]
        categories: Vec<u64>,
        /// Restrict to tag ids (repeatable)
        #[arg(long = "tag")]
        tags: Vec<u64>,
    },
    /// Fetch one post by numeric id or by slug
    Post { id_or_slug: String },
    /// Full-text search over posts
    Search {
        term: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List categories
    Categories,
    /// List tags
    Tags,
    /// List authors
    Authors,
    /// Fetch one author
    Author { id: i64 },
    /// Fetch one media item
    Media { id: i64 },
    /// Check that the API answers
    Health,
}

/// Resolved configuration for one CLI run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub client: ClientConfig,
    pub retry: RetryOptions,
    pub command: Command,
    pub verbose: bool,
}

impl RunConfig {
    /// Resolves CLI input on top of the environment-derived defaults.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let mut client = ClientConfig::from_env()?;

        if let Some(url) = cli.base_url {
            client.base_url = ApiBaseUrl::parse(&url)?;
        }
        if let Some(ms) = cli.timeout_ms {
            client.transport.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = cli.retries {
            client.transport.retry_attempts = retries;
        }
        if let Some(ms) = cli.retry_delay_ms {
            client.transport.retry_delay = Duration::from_millis(ms);
        }
        if cli.no_cache {
            client.cache_enabled = false;
        }

        if cli.max_attempts == 0 {
            return Err(AppError::InvalidConfiguration {
                key: "max-attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            client,
            retry: RetryOptions::default().with_max_attempts(cli.max_attempts),
            command: cli.command,
            verbose: cli.verbose,
        })
    }
}
