use super::Rendered;
use crate::types::MediaId;
use serde::{Deserialize, Serialize};

/// An item from the media library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub caption: Rendered,
    #[serde(default)]
    pub media_details: Option<MediaDetails>,
}

/// Dimensions as reported for images; absent for other media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetails {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.media_type == "image"
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let details = self.media_details.as_ref()?;
        Some((details.width?, details.height?))
    }
}
