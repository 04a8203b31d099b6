use crate::types::{CategoryId, TagId};
use serde::{Deserialize, Serialize};

/// A post category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    /// Number of published posts in the category.
    #[serde(default)]
    pub count: u64,
    /// 0 for top-level categories.
    #[serde(default)]
    pub parent: u64,
}

impl Category {
    pub fn is_top_level(&self) -> bool {
        self.parent == 0
    }
}

/// A post tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub count: u64,
}
