//! Admin identity as reported by the auth service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signed-in admin.
///
/// Owned by the external auth service; this codebase only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl AdminUser {
    /// Name to show in the admin chrome.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("Admin")
    }
}
