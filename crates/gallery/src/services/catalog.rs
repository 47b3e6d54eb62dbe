//! Cached read access to the public content tables.
//!
//! Listings are cached for a short TTL in a `moka` future cache. Rows are
//! never updated, so only list entries can go stale; they are dropped when
//! the backend change feed reports an insert into their table. Search results
//! are never cached.

use std::sync::Arc;
use std::time::Duration;

use micrart_backend::{Backend, BackendError, Table, TableChange};
use micrart_core::{Artwork, ArtworkId, BlogPost, NewReview, Review, Slug};
use moka::future::Cache;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, instrument, warn};

const MAX_CACHE_ENTRIES: u64 = 1000;

/// Cache key for the different kinds of cached data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Artworks,
    Artwork(ArtworkId),
    Reviews,
    PublishedPosts,
    Post(Slug),
}

/// Cached values.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Artworks(Arc<Vec<Artwork>>),
    Artwork(Arc<Artwork>),
    Reviews(Arc<Vec<Review>>),
    Posts(Arc<Vec<BlogPost>>),
    Post(Arc<BlogPost>),
}

/// Public content reads with a short-lived cache in front of the backend.
#[derive(Clone)]
pub struct Catalog {
    backend: Backend,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog whose entries live for `ttl`.
    #[must_use]
    pub fn new(backend: Backend, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { backend, cache }
    }

    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// All artworks, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn artworks(&self) -> Result<Arc<Vec<Artwork>>, BackendError> {
        if let Some(CacheValue::Artworks(artworks)) = self.cache.get(&CacheKey::Artworks).await {
            debug!("Cache hit for artworks");
            return Ok(artworks);
        }

        let artworks = Arc::new(self.backend.artworks().list().await?);
        self.cache
            .insert(CacheKey::Artworks, CacheValue::Artworks(artworks.clone()))
            .await;
        Ok(artworks)
    }

    /// A single artwork. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(artwork_id = %id))]
    pub async fn artwork(&self, id: ArtworkId) -> Result<Option<Arc<Artwork>>, BackendError> {
        let key = CacheKey::Artwork(id);
        if let Some(CacheValue::Artwork(artwork)) = self.cache.get(&key).await {
            debug!("Cache hit for artwork");
            return Ok(Some(artwork));
        }

        let Some(artwork) = self.backend.artworks().get(id).await? else {
            return Ok(None);
        };
        let artwork = Arc::new(artwork);
        self.cache
            .insert(key, CacheValue::Artwork(artwork.clone()))
            .await;
        Ok(Some(artwork))
    }

    /// All reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn reviews(&self) -> Result<Arc<Vec<Review>>, BackendError> {
        if let Some(CacheValue::Reviews(reviews)) = self.cache.get(&CacheKey::Reviews).await {
            debug!("Cache hit for reviews");
            return Ok(reviews);
        }

        let reviews = Arc::new(self.backend.reviews().list().await?);
        self.cache
            .insert(CacheKey::Reviews, CacheValue::Reviews(reviews.clone()))
            .await;
        Ok(reviews)
    }

    /// Published posts, newest first, optionally filtered by title.
    ///
    /// A non-blank `search` always goes to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn published_posts(
        &self,
        search: Option<&str>,
    ) -> Result<Arc<Vec<BlogPost>>, BackendError> {
        let search = search.map(str::trim).filter(|term| !term.is_empty());
        if search.is_some() {
            return Ok(Arc::new(
                self.backend.blog_posts().list_published(search).await?,
            ));
        }

        if let Some(CacheValue::Posts(posts)) = self.cache.get(&CacheKey::PublishedPosts).await {
            debug!("Cache hit for published posts");
            return Ok(posts);
        }

        let posts = Arc::new(self.backend.blog_posts().list_published(None).await?);
        self.cache
            .insert(CacheKey::PublishedPosts, CacheValue::Posts(posts.clone()))
            .await;
        Ok(posts)
    }

    /// A published post by slug. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn post(&self, slug: &Slug) -> Result<Option<Arc<BlogPost>>, BackendError> {
        let key = CacheKey::Post(slug.clone());
        if let Some(CacheValue::Post(post)) = self.cache.get(&key).await {
            debug!("Cache hit for post");
            return Ok(Some(post));
        }

        let Some(post) = self.backend.blog_posts().get_published(slug).await? else {
            return Ok(None);
        };
        let post = Arc::new(post);
        self.cache.insert(key, CacheValue::Post(post.clone())).await;
        Ok(Some(post))
    }

    /// Insert a review and drop the cached review list.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[instrument(skip(self, review), fields(user_name = %review.user_name()))]
    pub async fn submit_review(&self, review: &NewReview) -> Result<Review, BackendError> {
        let created = self.backend.reviews().create(review).await?;
        self.cache.invalidate(&CacheKey::Reviews).await;
        Ok(created)
    }

    /// Drop cached listings affected by `change`.
    pub async fn apply_change(&self, change: TableChange) {
        let key = match change.table {
            Table::Artworks => CacheKey::Artworks,
            Table::BlogPosts => CacheKey::PublishedPosts,
            Table::Reviews => CacheKey::Reviews,
        };
        debug!(table = %change.table, "Invalidating cached listing");
        self.cache.invalidate(&key).await;
    }

    /// Follow the backend change feed until it closes.
    ///
    /// Lagging behind the feed clears the whole cache.
    pub fn spawn_invalidation(&self) -> tokio::task::JoinHandle<()> {
        let catalog = self.clone();
        let mut changes = self.backend.database.subscribe_changes();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => catalog.apply_change(change).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Change feed lagged, clearing listing cache");
                        catalog.cache.invalidate_all();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use micrart_backend::MemoryBackend;
    use serde_json::json;

    use super::*;

    fn catalog(memory: &MemoryBackend) -> Catalog {
        Catalog::new(Backend::in_memory(memory), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_artworks_are_cached_until_change() {
        let memory = MemoryBackend::new();
        let catalog = catalog(&memory);
        memory
            .seed(Table::Artworks, json!({"title": "Rice", "image_url": "a.jpg"}))
            .await;

        assert_eq!(catalog.artworks().await.unwrap().len(), 1);

        memory
            .seed(Table::Artworks, json!({"title": "Chalk", "image_url": "b.jpg"}))
            .await;
        assert_eq!(catalog.artworks().await.unwrap().len(), 1);

        catalog
            .apply_change(TableChange::insert(Table::Artworks))
            .await;
        assert_eq!(catalog.artworks().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_artwork_is_not_cached() {
        let memory = MemoryBackend::new();
        let catalog = catalog(&memory);

        assert!(catalog.artwork(ArtworkId::new(1)).await.unwrap().is_none());

        memory
            .seed(Table::Artworks, json!({"title": "Rice", "image_url": "a.jpg"}))
            .await;
        assert!(catalog.artwork(ArtworkId::new(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_submit_review_refreshes_list() {
        let memory = MemoryBackend::new();
        let catalog = catalog(&memory);
        assert!(catalog.reviews().await.unwrap().is_empty());

        let review = NewReview::new("Ana", "Tiny and perfect", "4.5").unwrap();
        catalog.submit_review(&review).await.unwrap();

        let reviews = catalog.reviews().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].user_name, "Ana");
    }

    #[tokio::test]
    async fn test_search_bypasses_cache() {
        let memory = MemoryBackend::new();
        let catalog = catalog(&memory);
        memory
            .seed(
                Table::BlogPosts,
                json!({"title": "Carving Chalk", "content": "<p>x</p>", "slug": "carving-chalk", "published": true}),
            )
            .await;
        assert_eq!(catalog.published_posts(None).await.unwrap().len(), 1);

        memory
            .seed(
                Table::BlogPosts,
                json!({"title": "Pencil Lead", "content": "<p>y</p>", "slug": "pencil-lead", "published": true}),
            )
            .await;

        let found = catalog.published_posts(Some("PENCIL")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug.as_str(), "pencil-lead");
        assert_eq!(catalog.published_posts(Some("  ")).await.unwrap().len(), 1);
    }
}
