//! Domain model for WordPress content.
//!
//! These types mirror the REST representations closely enough to decode
//! them directly, with lenient defaults so a plugin that trims a field does
//! not turn a good response into an error.

mod media;
mod post;
mod terms;
mod users;

pub use media::{Media, MediaDetails};
pub use post::{Embedded, Post, Term};
pub use terms::{Category, Tag};
pub use users::Author;

use serde::{Deserialize, Serialize};

/// An HTML fragment as WordPress renders it (`{"rendered": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
    /// Present on content and excerpt; true for password-protected posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
}

impl Rendered {
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn is_protected(&self) -> bool {
        self.protected.unwrap_or(false)
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
    pub total_items: u64,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
