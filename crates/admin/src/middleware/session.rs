//! Session middleware configuration for admin.
//!
//! Sessions live in process memory; the auth service holds the durable
//! state, so a restart only costs admins a fresh sign-in.

use std::sync::Arc;

use tower_sessions::session::Id;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "micrart_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

fn expiry() -> Expiry {
    Expiry::OnInactivity(tower_sessions::cookie::time::Duration::seconds(
        SESSION_EXPIRY_SECONDS,
    ))
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    config: &AdminConfig,
    store: MemoryStore,
) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(expiry())
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// A handle on session `id` that loads its record from `store` afresh.
///
/// The session extracted by a streaming handler is the snapshot taken when
/// its request arrived; later refreshes and flushes only show up here.
#[must_use]
pub fn reload(store: &MemoryStore, id: Option<Id>) -> Session {
    Session::new(id, Arc::new(store.clone()), Some(expiry()))
}
