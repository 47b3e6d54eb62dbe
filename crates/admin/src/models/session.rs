//! Session-related types for admin authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use micrart_backend::AuthSession;
use micrart_core::AdminUser;

/// Session-stored admin identity.
///
/// `issued_at` is the sign-in time and survives token refreshes, so a
/// sign-out recorded after it revokes the session even if its tokens were
/// refreshed since.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub auth: AuthSession,
    pub issued_at: DateTime<Utc>,
}

impl AdminSession {
    #[must_use]
    pub const fn new(auth: AuthSession, issued_at: DateTime<Utc>) -> Self {
        Self { auth, issued_at }
    }

    #[must_use]
    pub const fn user(&self) -> &AdminUser {
        &self.auth.user
    }

    /// Replace the tokens after a refresh, keeping the sign-in time.
    #[must_use]
    pub fn refreshed(self, auth: AuthSession) -> Self {
        Self {
            auth,
            issued_at: self.issued_at,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the signed-in admin's [`super::AdminSession`].
    pub const ADMIN_SESSION: &str = "admin_session";

    /// Key for a one-shot message shown on the next dashboard render.
    pub const FLASH: &str = "flash";
}
