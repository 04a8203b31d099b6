use crate::types::AuthorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A post author (a WordPress user, public fields only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    /// Avatar URLs keyed by pixel size ("24", "48", "96").
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
}

impl Author {
    /// The largest avatar on offer.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar_urls
            .iter()
            .max_by_key(|(size, _)| size.parse::<u32>().unwrap_or(0))
            .map(|(_, url)| url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_avatar() {
        let author: Author = serde_json::from_str(
            r#"{"id": 2, "name": "Ada", "avatar_urls": {"24": "s", "96": "l", "48": "m"}}"#,
        )
        .unwrap();
        assert_eq!(author.avatar(), Some("l"));
    }
}
