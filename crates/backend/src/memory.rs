//! In-process backend.
//!
//! Implements all three gateway traits over `tokio::sync::RwLock`ed maps so
//! the binaries can run without a Supabase project. Row-level security is
//! approximated: inserts into `artworks` and `blog_posts` need a live admin
//! access token, `reviews` accepts anonymous inserts, and unpublished blog
//! posts are only visible to a live admin token.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use micrart_core::{AdminUser, Email};

use crate::auth::{AccessToken, AuthSession, RefreshToken};
use crate::error::BackendError;
use crate::events::{AuthEvent, CHANNEL_CAPACITY, TableChange};
use crate::gateway::{AuthService, Database, ObjectStorage};
use crate::query::{Direction, Filter, Select, Table};

/// Host used for public object URLs.
pub const PUBLIC_BASE: &str = "https://storage.micrart.invalid";

const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

/// An object held in a memory bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

struct Account {
    user: AdminUser,
    password: SecretString,
}

struct IssuedToken {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of [`Database`], [`ObjectStorage`], and
/// [`AuthService`].
///
/// Cloning shares the same store.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    next_id: AtomicI64,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    accounts: RwLock<Vec<Account>>,
    access_tokens: RwLock<HashMap<String, IssuedToken>>,
    refresh_tokens: RwLock<HashMap<String, Uuid>>,
    token_ttl: RwLock<Duration>,
    fail_uploads: AtomicBool,
    fail_counts: AtomicBool,
    changes: broadcast::Sender<TableChange>,
    auth_events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (auth_events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                tables: RwLock::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                objects: RwLock::new(HashMap::new()),
                accounts: RwLock::new(Vec::new()),
                access_tokens: RwLock::new(HashMap::new()),
                refresh_tokens: RwLock::new(HashMap::new()),
                token_ttl: RwLock::new(DEFAULT_TOKEN_TTL),
                fail_uploads: AtomicBool::new(false),
                fail_counts: AtomicBool::new(false),
                changes,
                auth_events,
            }),
        }
    }

    /// Register an admin account.
    pub async fn add_admin(&self, email: &str, password: &str) -> AdminUser {
        let user = AdminUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.inner.accounts.write().await.push(Account {
            user: user.clone(),
            password: SecretString::from(password.to_string()),
        });
        user
    }

    /// Insert a row directly, bypassing auth. Missing `id` and `created_at`
    /// are filled in like the real tables do.
    pub async fn seed(&self, table: Table, row: Value) -> Value {
        let row = self.complete_row(table, row);
        self.inner
            .tables
            .write()
            .await
            .entry(table)
            .or_default()
            .push(row.clone());
        row
    }

    /// Snapshot of every row in `table`, in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.inner
            .tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up an uploaded object.
    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.inner
            .objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Make every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.inner.fail_uploads.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make every subsequent count fail.
    pub fn fail_counts(&self, fail: bool) {
        self.inner.fail_counts.store(fail, AtomicOrdering::SeqCst);
    }

    /// Lifetime of access tokens issued from now on.
    pub async fn set_token_ttl(&self, ttl: Duration) {
        *self.inner.token_ttl.write().await = ttl;
    }

    /// Invalidate every outstanding refresh token without a sign-out event,
    /// as when the auth service expires them.
    pub async fn expire_refresh_tokens(&self) {
        self.inner.refresh_tokens.write().await.clear();
    }

    fn complete_row(&self, table: Table, mut row: Value) -> Value {
        if let Value::Object(map) = &mut row {
            if !map.contains_key("id") {
                let id = match table {
                    Table::BlogPosts => Value::String(Uuid::new_v4().to_string()),
                    Table::Artworks | Table::Reviews => Value::from(
                        self.inner.next_id.fetch_add(1, AtomicOrdering::SeqCst),
                    ),
                };
                map.insert("id".to_string(), id);
            }
            map.entry("created_at")
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        }
        row
    }

    async fn issue(&self, user: AdminUser) -> AuthSession {
        let expires_at = Utc::now() + *self.inner.token_ttl.read().await;
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();

        self.inner.access_tokens.write().await.insert(
            access_token.clone(),
            IssuedToken {
                user_id: user.id,
                expires_at,
            },
        );
        self.inner
            .refresh_tokens
            .write()
            .await
            .insert(refresh_token.clone(), user.id);

        AuthSession {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
            expires_at,
            user,
        }
    }

    /// Resolve a live access token to its user.
    async fn authorize(&self, token: Option<&AccessToken>) -> Result<Uuid, BackendError> {
        let token = token.ok_or_else(|| {
            BackendError::Auth("new row violates row-level security policy".to_string())
        })?;
        let tokens = self.inner.access_tokens.read().await;
        let issued = tokens
            .get(token.expose())
            .ok_or_else(|| BackendError::Auth("invalid JWT".to_string()))?;
        if issued.expires_at <= Utc::now() {
            return Err(BackendError::Auth("JWT expired".to_string()));
        }
        Ok(issued.user_id)
    }

    async fn account(&self, user_id: Uuid) -> Result<AdminUser, BackendError> {
        self.inner
            .accounts
            .read()
            .await
            .iter()
            .find(|account| account.user.id == user_id)
            .map(|account| account.user.clone())
            .ok_or_else(|| BackendError::Auth("User not found".to_string()))
    }
}

/// The value as PostgREST would compare it in a filter.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Anonymous readers only see published blog posts.
fn visible(table: Table, row: &Value, admin: bool) -> bool {
    admin || table != Table::BlogPosts || row.get("published") == Some(&Value::Bool(true))
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column).is_some_and(|v| plain(v) == *value),
        Filter::ILike { column, term } => row
            .get(column)
            .and_then(Value::as_str)
            .is_some_and(|v| v.to_lowercase().contains(&term.to_lowercase())),
    }
}

/// Order JSON scalars; nulls sort last like PostgREST's default.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl Database for MemoryBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let tables = self.inner.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table())
            .map(|rows| {
                rows.iter()
                    .filter(|row| visible(query.table(), row, false))
                    .filter(|row| query.filters().iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some((column, direction)) = query.ordering() {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(column), b.get(column));
                match direction {
                    Direction::Asc => ordering,
                    // Nulls still last when descending.
                    Direction::Desc => match (a.get(column), b.get(column)) {
                        (None | Some(Value::Null), _) | (_, None | Some(Value::Null)) => ordering,
                        _ => ordering.reverse(),
                    },
                }
            });
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        auth: Option<&AccessToken>,
    ) -> Result<u64, BackendError> {
        if self.inner.fail_counts.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Status {
                status: 503,
                message: "count unavailable".to_string(),
            });
        }
        let admin = match auth {
            Some(token) => self.authorize(Some(token)).await.is_ok(),
            None => false,
        };
        let tables = self.inner.tables.read().await;
        let count = tables.get(&table).map_or(0, |rows| {
            rows.iter()
                .filter(|row| visible(table, row, admin))
                .filter(|row| filters.iter().all(|f| matches(row, f)))
                .count()
        });
        Ok(count as u64)
    }

    async fn insert(
        &self,
        table: Table,
        row: Value,
        auth: Option<&AccessToken>,
    ) -> Result<Value, BackendError> {
        if matches!(table, Table::Artworks | Table::BlogPosts) {
            self.authorize(auth).await?;
        }
        if !row.is_object() {
            return Err(BackendError::Status {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        }

        let row = self.seed(table, row).await;
        let _ = self.inner.changes.send(TableChange::insert(table));
        Ok(row)
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<TableChange> {
        self.inner.changes.subscribe()
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
        auth: &AccessToken,
    ) -> Result<String, BackendError> {
        if self.inner.fail_uploads.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Storage("upload rejected".to_string()));
        }
        self.authorize(Some(auth)).await?;

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.inner.objects.write().await;
        if !upsert && objects.contains_key(&key) {
            return Err(BackendError::Storage("The resource already exists".to_string()));
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{PUBLIC_BASE}/storage/v1/object/public/{bucket}/{path}")
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let user = self
            .inner
            .accounts
            .read()
            .await
            .iter()
            .find(|account| {
                account
                    .user
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email.as_str()))
                    && account.password.expose_secret() == password.expose_secret()
            })
            .map(|account| account.user.clone())
            .ok_or_else(|| BackendError::Auth("Invalid login credentials".to_string()))?;

        let session = self.issue(user).await;
        let _ = self.inner.auth_events.send(AuthEvent::SignedIn {
            user_id: session.user.id,
            at: Utc::now(),
        });
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthSession, BackendError> {
        let user_id = self
            .inner
            .refresh_tokens
            .write()
            .await
            .remove(refresh_token.expose())
            .ok_or_else(|| BackendError::Auth("Invalid Refresh Token".to_string()))?;
        let user = self.account(user_id).await?;

        let session = self.issue(user).await;
        let _ = self.inner.auth_events.send(AuthEvent::TokenRefreshed {
            user_id,
            at: Utc::now(),
        });
        Ok(session)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        let user_id = session.user.id;
        self.inner
            .access_tokens
            .write()
            .await
            .retain(|_, issued| issued.user_id != user_id);
        self.inner
            .refresh_tokens
            .write()
            .await
            .retain(|_, owner| *owner != user_id);

        let _ = self.inner.auth_events.send(AuthEvent::SignedOut {
            user_id,
            at: Utc::now(),
        });
        Ok(())
    }

    async fn get_user(&self, access_token: &AccessToken) -> Result<AdminUser, BackendError> {
        let user_id = self.authorize(Some(access_token)).await?;
        self.account(user_id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.auth_events.subscribe()
    }
}
