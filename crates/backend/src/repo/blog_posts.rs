//! Blog post repository.

use tracing::instrument;

use micrart_core::{BlogPost, NewBlogPost, Slug};

use super::{decode_first, decode_rows};
use crate::auth::AccessToken;
use crate::error::BackendError;
use crate::gateway::Database;
use crate::query::{Select, Table};

/// Repository for blog post rows.
pub struct BlogPostRepository<'a> {
    db: &'a dyn Database,
}

impl<'a> BlogPostRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Published posts, newest first, optionally filtered by a
    /// case-insensitive title substring.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the select fails or a row does not decode.
    #[instrument(skip(self))]
    pub async fn list_published(&self, search: Option<&str>) -> Result<Vec<BlogPost>, BackendError> {
        let mut query = Select::from(Table::BlogPosts).eq("published", true);
        if let Some(term) = search {
            query = query.ilike("title", term);
        }
        let rows = self.db.select(&query.order_desc("created_at")).await?;
        decode_rows(rows)
    }

    /// A published post by slug.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the select fails or the row does not decode.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_published(&self, slug: &Slug) -> Result<Option<BlogPost>, BackendError> {
        let query = Select::from(Table::BlogPosts)
            .eq("slug", slug)
            .eq("published", true)
            .limit(1);
        decode_first(self.db.select(&query).await?)
    }

    /// Whether any post, published or not, already uses `slug`.
    ///
    /// Counted as the admin so drafts hidden by row-level security are seen.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the count fails.
    #[instrument(skip(self, auth), fields(slug = %slug))]
    pub async fn slug_exists(&self, slug: &Slug, auth: &AccessToken) -> Result<bool, BackendError> {
        let query = Select::from(Table::BlogPosts).eq("slug", slug);
        let count = self
            .db
            .count(Table::BlogPosts, query.filters(), Some(auth))
            .await?;
        Ok(count > 0)
    }

    /// Exact number of blog posts visible to `auth`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the count fails.
    pub async fn count(&self, auth: Option<&AccessToken>) -> Result<u64, BackendError> {
        self.db.count(Table::BlogPosts, &[], auth).await
    }

    /// Insert one post as the signed-in admin.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the insert is rejected.
    #[instrument(skip(self, post, auth), fields(slug = %post.slug()))]
    pub async fn create(
        &self,
        post: &NewBlogPost,
        auth: &AccessToken,
    ) -> Result<BlogPost, BackendError> {
        let row = self
            .db
            .insert(Table::BlogPosts, serde_json::to_value(post)?, Some(auth))
            .await?;
        Ok(serde_json::from_value(row)?)
    }
}
