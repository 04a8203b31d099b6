use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

/// A caller passed an argument the API would never accept.
///
/// Raised before any request is issued, so it always points at the call
/// site rather than at the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {field}: expected a positive integer, got {value}")]
    NonPositiveId { field: &'static str, value: i64 },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Value out of bounds for {field}: {value}, expected {min}..={max}")]
    OutOfBounds {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ValidationError {
    /// The name of the offending argument.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NonPositiveId { field, .. } => field,
            Self::EmptyField(field) => field,
            Self::OutOfBounds { field, .. } => field,
            Self::InvalidUrl { .. } => "base_url",
        }
    }
}
