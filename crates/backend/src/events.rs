//! Change and auth event feeds.
//!
//! Both feeds are `tokio::sync::broadcast` channels. Subscribers that lag
//! miss events and should simply re-fetch; every consumer only reads
//! idempotent state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::query::Table;

/// Capacity of each broadcast channel.
pub const CHANNEL_CAPACITY: usize = 64;

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
}

/// A row in `table` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableChange {
    pub table: Table,
    pub kind: ChangeKind,
}

impl TableChange {
    #[must_use]
    pub const fn insert(table: Table) -> Self {
        Self {
            table,
            kind: ChangeKind::Insert,
        }
    }
}

/// Auth state transitions reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid, at: DateTime<Utc> },
    TokenRefreshed { user_id: Uuid, at: DateTime<Utc> },
    /// Every session of `user_id` issued before `at` is gone.
    SignedOut { user_id: Uuid, at: DateTime<Utc> },
}

impl AuthEvent {
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        match self {
            Self::SignedIn { user_id, .. }
            | Self::TokenRefreshed { user_id, .. }
            | Self::SignedOut { user_id, .. } => *user_id,
        }
    }
}
