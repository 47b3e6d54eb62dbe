//! Application state shared across handlers.

use std::sync::Arc;

use micrart_backend::Backend;

use crate::config::GalleryConfig;
use crate::services::Catalog;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GalleryConfig,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Must be called inside a Tokio runtime: the catalog starts following
    /// the backend change feed immediately.
    #[must_use]
    pub fn new(config: GalleryConfig, backend: Backend) -> Self {
        let catalog = Catalog::new(backend, config.cache_ttl);
        catalog.spawn_invalidation();

        Self {
            inner: Arc::new(AppStateInner { config, catalog }),
        }
    }

    /// Get a reference to the gallery configuration.
    #[must_use]
    pub fn config(&self) -> &GalleryConfig {
        &self.inner.config
    }

    /// Get a reference to the cached content reader.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the backend gateway.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        self.inner.catalog.backend()
    }
}
