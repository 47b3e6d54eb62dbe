//! Artwork repository.

use tracing::instrument;

use micrart_core::{Artwork, ArtworkId, NewArtwork};

use super::{decode_first, decode_rows};
use crate::auth::AccessToken;
use crate::error::BackendError;
use crate::gateway::Database;
use crate::query::{Select, Table};

/// Repository for artwork rows.
pub struct ArtworkRepository<'a> {
    db: &'a dyn Database,
}

impl<'a> ArtworkRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Every artwork, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the select fails or a row does not decode.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Artwork>, BackendError> {
        let rows = self
            .db
            .select(&Select::from(Table::Artworks).order_desc("created_at"))
            .await?;
        decode_rows(rows)
    }

    /// A single artwork by id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the select fails or the row does not decode.
    #[instrument(skip(self), fields(artwork_id = %id))]
    pub async fn get(&self, id: ArtworkId) -> Result<Option<Artwork>, BackendError> {
        let rows = self
            .db
            .select(&Select::from(Table::Artworks).eq("id", id).limit(1))
            .await?;
        decode_first(rows)
    }

    /// Exact number of artworks.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the count fails.
    pub async fn count(&self, auth: Option<&AccessToken>) -> Result<u64, BackendError> {
        self.db.count(Table::Artworks, &[], auth).await
    }

    /// Insert one artwork as the signed-in admin.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the insert is rejected.
    #[instrument(skip(self, artwork, auth), fields(title = %artwork.title()))]
    pub async fn create(
        &self,
        artwork: &NewArtwork,
        auth: &AccessToken,
    ) -> Result<Artwork, BackendError> {
        let row = self
            .db
            .insert(Table::Artworks, serde_json::to_value(artwork)?, Some(auth))
            .await?;
        Ok(serde_json::from_value(row)?)
    }
}
