//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Root of a WordPress REST namespace, e.g. `https://example.com/wp-json/wp/v2`.
///
/// Always stored with a trailing slash so relative endpoint paths join
/// underneath it instead of replacing the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBaseUrl(Url);

impl ApiBaseUrl {
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let trimmed = url.trim();
        let mut parsed = Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::InvalidUrl {
                url: trimmed.to_string(),
                reason: "Only HTTP and HTTPS URLs are supported".to_string(),
            });
        }

        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        parsed.set_query(None);
        parsed.set_fragment(None);

        Ok(Self(parsed))
    }

    /// Resolves an endpoint path (`posts`, `/users/3`) against the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ValidationError> {
        self.0
            .join(path.trim_start_matches('/'))
            .map_err(|e| ValidationError::InvalidUrl {
                url: format!("{}{}", self.0, path),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ApiBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ApiBaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ApiBaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiBaseUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// URL slug of a post or term. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(slug: impl AsRef<str>) -> Result<Self, ValidationError> {
        let slug = slug.as_ref().trim();
        if slug.is_empty() {
            return Err(ValidationError::EmptyField("slug"));
        }
        Ok(Self(slug.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text search input. Never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: impl AsRef<str>) -> Result<Self, ValidationError> {
        let term = term.as_ref().trim();
        if term.is_empty() {
            return Err(ValidationError::EmptyField("search term"));
        }
        Ok(Self(term.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_validation() {
        assert!(ApiBaseUrl::parse("https://example.com/wp-json/wp/v2").is_ok());
        assert!(ApiBaseUrl::parse("http://localhost:8080").is_ok());
        assert!(ApiBaseUrl::parse("ftp://example.com").is_err());
        assert!(ApiBaseUrl::parse("not a url").is_err());
    }

    #[test]
    fn endpoints_join_under_the_namespace() {
        let base = ApiBaseUrl::parse("https://example.com/wp-json/wp/v2").unwrap();
        assert_eq!(base.as_str(), "https://example.com/wp-json/wp/v2/");
        assert_eq!(
            base.endpoint("/posts/12").unwrap().as_str(),
            "https://example.com/wp-json/wp/v2/posts/12"
        );
        assert_eq!(
            base.endpoint("categories").unwrap().as_str(),
            "https://example.com/wp-json/wp/v2/categories"
        );
    }

    #[test]
    fn test_slug_validation() {
        assert_eq!(Slug::new("  hello-world ").unwrap().as_str(), "hello-world");
        assert_eq!(
            Slug::new("   ").unwrap_err(),
            ValidationError::EmptyField("slug")
        );
        assert!(SearchTerm::new("").is_err());
        assert_eq!(SearchTerm::new(" rust ").unwrap().as_str(), "rust");
    }
}
