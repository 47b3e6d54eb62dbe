//! Micrart Backend - gateway to the hosted backend-as-a-service.
//!
//! All persistence and authentication is delegated to a managed service
//! (Supabase). The web binaries never talk to it directly; they go through
//! three narrow traits:
//!
//! - [`Database`] - filtered selects, exact counts, inserts, change feed
//! - [`ObjectStorage`] - uploads and public URLs
//! - [`AuthService`] - password sign-in, refresh, sign-out, auth events
//!
//! [`Backend`] bundles one implementation of each. Two are provided:
//!
//! - [`SupabaseClient`] - REST calls against a Supabase project
//! - [`MemoryBackend`] - in-process tables, used by tests and local demos
//!
//! Typed access to the three content tables lives in [`repo`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod repo;
pub mod supabase;

pub use auth::{AccessToken, AuthSession, RefreshToken};
pub use config::{ConfigError, SupabaseConfig};
pub use error::BackendError;
pub use events::{AuthEvent, ChangeKind, TableChange};
pub use gateway::{AuthService, Database, ObjectStorage};
pub use memory::MemoryBackend;
pub use query::{Select, Table};
pub use repo::{ArtworkRepository, BlogPostRepository, ReviewRepository};
pub use supabase::SupabaseClient;

/// The three gateway services, shared by every handler.
#[derive(Clone)]
pub struct Backend {
    pub database: Arc<dyn Database>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: Arc<dyn AuthService>,
}

impl Backend {
    /// Connect to a Supabase project.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn supabase(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let client = Arc::new(SupabaseClient::new(config)?);
        Ok(Self {
            database: client.clone(),
            storage: client.clone(),
            auth: client,
        })
    }

    /// Back every service with the same in-memory store.
    #[must_use]
    pub fn in_memory(memory: &MemoryBackend) -> Self {
        let shared = Arc::new(memory.clone());
        Self {
            database: shared.clone(),
            storage: shared.clone(),
            auth: shared,
        }
    }

    #[must_use]
    pub fn artworks(&self) -> ArtworkRepository<'_> {
        ArtworkRepository::new(self.database.as_ref())
    }

    #[must_use]
    pub fn blog_posts(&self) -> BlogPostRepository<'_> {
        BlogPostRepository::new(self.database.as_ref())
    }

    #[must_use]
    pub fn reviews(&self) -> ReviewRepository<'_> {
        ReviewRepository::new(self.database.as_ref())
    }
}
