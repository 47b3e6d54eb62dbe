//! Validation failures detected before any backend call.

use crate::types::rating::RatingError;

/// A submission was rejected before reaching the backend.
///
/// The `Display` text is shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Artwork form is missing its title or cropped image.
    #[error("Title and image are required.")]
    ArtworkIncomplete,

    /// Blog form is missing its title, content, or cover image.
    #[error("Title, content, and cover image are required.")]
    BlogIncomplete,

    /// The title contains no characters a slug can be built from.
    #[error("Title must contain at least one letter or number.")]
    UnsluggableTitle,

    /// Review form is missing a field or has a zero rating.
    #[error("Please fill all fields and select a rating.")]
    ReviewIncomplete,

    /// Review rating could not be parsed.
    #[error("Invalid rating: {0}")]
    Rating(#[from] RatingError),

    /// A text field exceeds its maximum length.
    #[error("{field} must be at most {max} characters.")]
    TooLong {
        /// Human-readable field name.
        field: &'static str,
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// Reject `value` if it is longer than `max` characters.
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Trim and return `None` for blank input.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
