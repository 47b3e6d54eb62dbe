//! Application state shared across handlers.

use std::sync::Arc;

use micrart_backend::Backend;
use tower_sessions::MemoryStore;

use crate::config::AdminConfig;
use crate::services::{SessionWatcher, UploadTracker};

/// Application state shared across all handlers.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: Backend,
    uploads: UploadTracker,
    watcher: SessionWatcher,
    sessions: MemoryStore,
}

impl AppState {
    /// Create the state and start watching the auth event feed.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(config: AdminConfig, backend: Backend) -> Self {
        let watcher = SessionWatcher::spawn(backend.auth.as_ref());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                uploads: UploadTracker::new(),
                watcher,
                sessions: MemoryStore::default(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadTracker {
        &self.inner.uploads
    }

    #[must_use]
    pub fn watcher(&self) -> &SessionWatcher {
        &self.inner.watcher
    }

    /// Store behind the session layer.
    #[must_use]
    pub fn sessions(&self) -> &MemoryStore {
        &self.inner.sessions
    }
}
