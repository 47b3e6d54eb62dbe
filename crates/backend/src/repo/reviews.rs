//! Review repository.

use tracing::instrument;

use micrart_core::{NewReview, Review};

use super::decode_rows;
use crate::error::BackendError;
use crate::gateway::Database;
use crate::query::{Select, Table};

/// Repository for visitor reviews.
pub struct ReviewRepository<'a> {
    db: &'a dyn Database,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Every review, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the select fails or a row does not decode.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Review>, BackendError> {
        let rows = self
            .db
            .select(&Select::from(Table::Reviews).order_desc("created_at"))
            .await?;
        decode_rows(rows)
    }

    /// Insert a review anonymously.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the insert is rejected.
    #[instrument(skip(self, review), fields(user_name = %review.user_name()))]
    pub async fn create(&self, review: &NewReview) -> Result<Review, BackendError> {
        let row = self
            .db
            .insert(Table::Reviews, serde_json::to_value(review)?, None)
            .await?;
        Ok(serde_json::from_value(row)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryBackend;

    #[tokio::test]
    async fn test_reviews_newest_first() {
        let backend = MemoryBackend::new();
        backend
            .seed(
                Table::Reviews,
                json!({"user_name": "Old", "comment": "c", "rating": 3, "created_at": "2025-01-01T00:00:00+00:00"}),
            )
            .await;
        backend
            .seed(
                Table::Reviews,
                json!({"user_name": "New", "comment": "c", "rating": 4.5, "created_at": "2025-02-01T00:00:00+00:00"}),
            )
            .await;

        let reviews = ReviewRepository::new(&backend).list().await.unwrap();
        assert_eq!(reviews[0].user_name, "New");
        assert_eq!(reviews[0].rating.unwrap().tenths(), 45);
    }

    #[tokio::test]
    async fn test_create_review() {
        let backend = MemoryBackend::new();
        let review = NewReview::new("Ana", "Lovely", "5").unwrap();
        let stored = ReviewRepository::new(&backend).create(&review).await.unwrap();
        assert_eq!(stored.comment, "Lovely");
        assert_eq!(backend.rows(Table::Reviews).await.len(), 1);
    }
}
