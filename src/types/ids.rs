use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for WordPress resource ids with phantom types
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceId<T> {
    value: u64,
    _phantom: PhantomData<T>,
}

/// Marker types for the resource kinds the client addresses by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaMarker;

pub type PostId = ResourceId<PostMarker>;
pub type CategoryId = ResourceId<CategoryMarker>;
pub type TagId = ResourceId<TagMarker>;
pub type AuthorId = ResourceId<AuthorMarker>;
pub type MediaId = ResourceId<MediaMarker>;

/// Names the argument a marker validates, for error messages.
pub trait IdKind {
    const FIELD: &'static str;
}

impl IdKind for PostMarker {
    const FIELD: &'static str = "post id";
}

impl IdKind for CategoryMarker {
    const FIELD: &'static str = "category id";
}

impl IdKind for TagMarker {
    const FIELD: &'static str = "tag id";
}

impl IdKind for AuthorMarker {
    const FIELD: &'static str = "author id";
}

impl IdKind for MediaMarker {
    const FIELD: &'static str = "media id";
}

impl<T: IdKind> ResourceId<T> {
    /// Validates a raw id. WordPress ids start at 1.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositiveId {
                field: T::FIELD,
                value,
            });
        }
        Ok(Self {
            value: value as u64,
            _phantom: PhantomData,
        })
    }
}

impl<T> ResourceId<T> {
    pub fn get(&self) -> u64 {
        self.value
    }
}

// Manual impls: derives would put bounds on the marker.
impl<T> Clone for ResourceId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceId<T> {}

impl<T> fmt::Display for ResourceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for ResourceId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ResourceId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        Ok(Self {
            value,
            _phantom: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative_ids() {
        assert_eq!(
            PostId::new(0).unwrap_err(),
            ValidationError::NonPositiveId {
                field: "post id",
                value: 0
            }
        );
        let err = MediaId::new(-7).unwrap_err();
        assert_eq!(err.field(), "media id");
    }

    #[test]
    fn accepts_positive_ids() {
        let id = CategoryId::new(42).unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn serializes_as_bare_number() {
        let id = TagId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let back: TagId = serde_json::from_str("9").unwrap();
        assert_eq!(back, id);
    }
}
