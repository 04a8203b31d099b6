use super::{Author, Media, Rendered};
use crate::types::{AuthorId, CategoryId, MediaId, PostId, TagId};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub link: String,
    /// Site-local publication time, as WordPress reports it (no offset).
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_gmt: Option<NaiveDateTime>,
    #[serde(default)]
    pub modified: Option<NaiveDateTime>,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub author: Option<AuthorId>,
    /// WordPress sends 0 for "no featured image".
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub sticky: bool,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
}

impl Post {
    pub fn featured_media_id(&self) -> Option<MediaId> {
        i64::try_from(self.featured_media)
            .ok()
            .and_then(|id| MediaId::new(id).ok())
    }

    /// The embedded author, when the post was fetched with `_embed`.
    pub fn embedded_author(&self) -> Option<&Author> {
        self.embedded.as_ref()?.author.first()
    }

    /// The embedded featured image, when the post was fetched with `_embed`.
    pub fn featured_image(&self) -> Option<&Media> {
        self.embedded.as_ref()?.featured_media.first()
    }

    /// Embedded terms of the given taxonomy (`category`, `post_tag`).
    pub fn embedded_terms<'a>(&'a self, taxonomy: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.embedded
            .iter()
            .flat_map(|e| e.terms.iter())
            .flatten()
            .filter(move |term| term.taxonomy == taxonomy)
    }
}

/// Related objects inlined by `_embed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
///
/// WordPress inlines an error object (`{"code": ..., "message": ...}`) in
/// place of a relation the caller may not read. Such entries are dropped.
pub struct Embedded {
    #[serde(default, deserialize_with = "readable_entries")]
    pub author: Vec<Author>,
    #[serde(
        rename = "wp:featuredmedia",
        default,
        deserialize_with = "readable_entries"
    )]
    pub featured_media: Vec<Media>,
    /// One list per taxonomy, in the order WordPress registers them.
    #[serde(rename = "wp:term", default, deserialize_with = "readable_term_lists")]
    pub terms: Vec<Vec<Term>>,
}

/// A taxonomy term as it appears inside `_embedded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
    #[serde(default)]
    pub link: String,
}

fn keep_decodable<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

fn readable_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(keep_decodable(Vec::<Value>::deserialize(deserializer)?))
}

fn readable_term_lists<'de, D>(deserializer: D) -> Result<Vec<Vec<Term>>, D::Error>
where
    D: Deserializer<'de>,
{
    let lists = Vec::<Value>::deserialize(deserializer)?;
    Ok(lists
        .into_iter()
        .filter_map(|list| match list {
            Value::Array(entries) => Some(keep_decodable(entries)),
            _ => None,
        })
        .collect())
}
