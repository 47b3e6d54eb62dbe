//! The narrow interface the web binaries depend on.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::broadcast;

use micrart_core::{AdminUser, Email};

use crate::auth::{AccessToken, AuthSession, RefreshToken};
use crate::error::BackendError;
use crate::events::{AuthEvent, TableChange};
use crate::query::{Filter, Select, Table};

/// Row reads and inserts.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a select and return the raw rows.
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError>;

    /// Exact number of rows in `table` matching `filters`.
    ///
    /// Row-level security applies: without the admin's access token,
    /// unpublished blog posts are not counted.
    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        auth: Option<&AccessToken>,
    ) -> Result<u64, BackendError>;

    /// Insert one row and return it as stored.
    ///
    /// Writes to admin-owned tables need the admin's access token.
    async fn insert(
        &self,
        table: Table,
        row: Value,
        auth: Option<&AccessToken>,
    ) -> Result<Value, BackendError>;

    /// Subscribe to row changes.
    fn subscribe_changes(&self) -> broadcast::Receiver<TableChange>;
}

/// Object storage buckets.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `bucket/path`. Returns the stored path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
        auth: &AccessToken,
    ) -> Result<String, BackendError>;

    /// Public URL of an object. Does not check that it exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Password auth for admins.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthSession, BackendError>;

    /// Revoke the session. Emits [`AuthEvent::SignedOut`].
    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError>;

    /// Look up the user behind an access token.
    async fn get_user(&self, access_token: &AccessToken) -> Result<AdminUser, BackendError>;

    /// Subscribe to auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
