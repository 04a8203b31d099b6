//! Canonical query parameter sets.
//!
//! Parameters are kept sorted by name so that one logical request always
//! serializes to one query string, and therefore to one cache key, no matter
//! the order the parameters were added in.

use std::collections::BTreeMap;
use std::fmt;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Serialized comma-joined, the way WordPress reads array filters.
    Ids(Vec<u64>),
}

impl QueryValue {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Ids(ids) if ids.is_empty())
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Ids(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", id)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<u32> for QueryValue {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for QueryValue {
    fn from(n: u64) -> Self {
        Self::Ids(vec![n])
    }
}

impl From<Vec<u64>> for QueryValue {
    fn from(ids: Vec<u64>) -> Self {
        Self::Ids(ids)
    }
}

impl From<&[u64]> for QueryValue {
    fn from(ids: &[u64]) -> Self {
        Self::Ids(ids.to_vec())
    }
}

/// Query parameters, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value. Empty id lists are dropped.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&name);
        } else {
            self.0.insert(name, value);
        }
        self
    }

    /// Sets `name` only when a value is present; `None` leaves it out entirely.
    pub fn set_opt<V: Into<QueryValue>>(
        &mut self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_opt<V: Into<QueryValue>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.set_opt(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<QueryValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Percent-encoded query string in canonical (sorted) order.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.0 {
            serializer.append_pair(name, &value.to_string());
        }
        serializer.finish()
    }

    /// Cache key for a request to `path` with these parameters.
    pub fn cache_key(&self, path: &str) -> String {
        format!("{}?{}", path.trim_start_matches('/'), self.to_query_string())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insertion_order_does_not_change_the_key() {
        let a = QueryParams::new()
            .with("per_page", 10u32)
            .with("page", 2u32)
            .with("search", "rust");
        let b = QueryParams::new()
            .with("search", "rust")
            .with("page", 2u32)
            .with("per_page", 10u32);

        assert_eq!(a.cache_key("/posts"), b.cache_key("posts"));
        assert_eq!(a.to_query_string(), "page=2&per_page=10&search=rust");
    }

    #[test]
    fn absent_values_are_omitted() {
        let params = QueryParams::new()
            .with_opt("search", None::<&str>)
            .with_opt("page", Some(1u32))
            .with("categories", Vec::<u64>::new());

        assert_eq!(params.len(), 1);
        assert_eq!(params.to_query_string(), "page=1");
    }

    #[test]
    fn id_lists_are_comma_joined() {
        let params = QueryParams::new().with("categories", vec![3u64, 7, 11]);
        assert_eq!(params.get("categories").unwrap().to_string(), "3,7,11");
        assert_eq!(params.to_query_string(), "categories=3%2C7%2C11");
    }

    #[test]
    fn values_are_percent_encoded() {
        let params: QueryParams = [("search", "fish & chips")].into_iter().collect();
        assert_eq!(params.to_query_string(), "search=fish+%26+chips");
    }

    #[test]
    fn different_pages_never_share_a_key() {
        let one = QueryParams::new().with("page", 1u32);
        let two = QueryParams::new().with("page", 2u32);
        assert_ne!(one.cache_key("posts"), two.cache_key("posts"));
    }
}
