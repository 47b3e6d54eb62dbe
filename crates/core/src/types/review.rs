//! Visitor reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::ReviewId;
use crate::types::rating::Rating;
use crate::types::validation::{ValidationError, check_length, non_blank};

/// A review as stored in the `reviews` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_name: String,
    pub comment: String,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    user_name: String,
    comment: String,
    rating: Rating,
}

impl NewReview {
    /// Maximum name length in characters.
    pub const MAX_NAME: usize = 100;
    /// Maximum comment length in characters.
    pub const MAX_COMMENT: usize = 2_000;

    /// Validate the review form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ReviewIncomplete`] if the name or comment is
    /// blank or the rating is zero, and [`ValidationError::Rating`] if the
    /// rating is not a number in range.
    pub fn new(user_name: &str, comment: &str, rating: &str) -> Result<Self, ValidationError> {
        let (Some(user_name), Some(comment)) = (non_blank(user_name), non_blank(comment)) else {
            return Err(ValidationError::ReviewIncomplete);
        };
        let rating = match non_blank(rating) {
            Some(raw) => Rating::parse(raw)?,
            None => Rating::default(),
        };
        if rating.is_zero() {
            return Err(ValidationError::ReviewIncomplete);
        }
        check_length("Name", user_name, Self::MAX_NAME)?;
        check_length("Comment", comment, Self::MAX_COMMENT)?;

        Ok(Self {
            user_name: user_name.to_string(),
            comment: comment.to_string(),
            rating,
        })
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub const fn rating(&self) -> Rating {
        self.rating
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rating_rejected() {
        assert_eq!(
            NewReview::new("Ana", "Lovely detail", "0"),
            Err(ValidationError::ReviewIncomplete)
        );
        assert_eq!(
            NewReview::new("Ana", "Lovely detail", ""),
            Err(ValidationError::ReviewIncomplete)
        );
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert_eq!(
            NewReview::new("", "Lovely detail", "4"),
            Err(ValidationError::ReviewIncomplete)
        );
        assert_eq!(
            NewReview::new("Ana", "  ", "4"),
            Err(ValidationError::ReviewIncomplete)
        );
    }

    #[test]
    fn test_invalid_rating_rejected() {
        assert!(matches!(
            NewReview::new("Ana", "Lovely detail", "7"),
            Err(ValidationError::Rating(_))
        ));
    }

    #[test]
    fn test_fractional_rating_accepted() {
        let review = NewReview::new(" Ana ", "Lovely detail", "4.3").unwrap();
        assert_eq!(review.user_name(), "Ana");
        assert_eq!(review.rating().tenths(), 43);

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["rating"], 4.3);
    }

    #[test]
    fn test_review_row_without_rating() {
        let row = serde_json::json!({
            "id": 1,
            "user_name": "Ana",
            "comment": "Lovely",
            "rating": null,
        });
        let review: Review = serde_json::from_value(row).unwrap();
        assert!(review.rating.is_none());
    }
}
