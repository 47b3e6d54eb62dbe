//! Gallery artworks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::ArtworkId;
use crate::types::validation::{ValidationError, check_length, non_blank};

/// A gallery entry as stored in the `artworks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new artwork.
///
/// Only obtainable through [`NewArtwork::new`], so every value that reaches
/// the backend has a title and an uploaded image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewArtwork {
    title: String,
    description: Option<String>,
    image_url: String,
}

impl NewArtwork {
    /// Maximum title length in characters.
    pub const MAX_TITLE: usize = 200;
    /// Maximum description length in characters.
    pub const MAX_DESCRIPTION: usize = 5_000;

    /// Validate the artwork form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ArtworkIncomplete`] if the title is blank or
    /// no image has been uploaded yet, or [`ValidationError::TooLong`] if a
    /// field exceeds its limit.
    pub fn new(
        title: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (Some(title), Some(image_url)) = (non_blank(title), image_url.and_then(non_blank))
        else {
            return Err(ValidationError::ArtworkIncomplete);
        };
        check_length("Title", title, Self::MAX_TITLE)?;
        check_length("Description", description, Self::MAX_DESCRIPTION)?;

        Ok(Self {
            title: title.to_string(),
            description: non_blank(description).map(String::from),
            image_url: image_url.to_string(),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.image_url
    }
}
