//! Process-wide listener on the auth service's event feed.
//!
//! Keeps the latest sign-out time per user. The auth guard treats every
//! session issued at or before that time as gone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use micrart_backend::{AuthEvent, AuthService};

/// Sign-out times recorded from the auth event feed.
#[derive(Clone, Default)]
pub struct SessionWatcher {
    revoked: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl SessionWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `auth` and record events for the life of the process.
    #[must_use]
    pub fn spawn(auth: &dyn AuthService) -> Self {
        let watcher = Self::new();
        let mut events = auth.subscribe();
        let recorder = watcher.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => recorder.record(&event).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Session watcher lagged behind auth events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Auth event feed closed");
                        break;
                    }
                }
            }
        });

        watcher
    }

    /// Apply one auth event.
    pub async fn record(&self, event: &AuthEvent) {
        if let AuthEvent::SignedOut { user_id, at } = event {
            tracing::info!(%user_id, "Admin signed out");
            let mut revoked = self.revoked.write().await;
            let entry = revoked.entry(*user_id).or_insert(*at);
            if *entry < *at {
                *entry = *at;
            }
        }
    }

    /// Latest sign-out recorded for `user_id`.
    pub async fn revoked_at(&self, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.revoked.read().await.get(&user_id).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;
    use micrart_backend::MemoryBackend;
    use micrart_core::Email;
    use secrecy::SecretString;

    use super::*;

    #[tokio::test]
    async fn test_keeps_latest_sign_out() {
        let watcher = SessionWatcher::new();
        let user_id = Uuid::new_v4();
        let later = Utc::now();
        let earlier = later - TimeDelta::minutes(5);

        watcher
            .record(&AuthEvent::SignedOut { user_id, at: later })
            .await;
        watcher
            .record(&AuthEvent::SignedOut {
                user_id,
                at: earlier,
            })
            .await;

        assert_eq!(watcher.revoked_at(user_id).await, Some(later));
    }

    #[tokio::test]
    async fn test_ignores_sign_in_events() {
        let watcher = SessionWatcher::new();
        let user_id = Uuid::new_v4();
        watcher
            .record(&AuthEvent::SignedIn {
                user_id,
                at: Utc::now(),
            })
            .await;
        assert_eq!(watcher.revoked_at(user_id).await, None);
    }

    #[tokio::test]
    async fn test_spawned_watcher_sees_sign_out() {
        let memory = MemoryBackend::new();
        let user = memory.add_admin("admin@micrart.test", "hunter22").await;
        let watcher = SessionWatcher::spawn(&memory);

        let session = memory
            .sign_in_with_password(
                &Email::parse("admin@micrart.test").unwrap(),
                &SecretString::from("hunter22"),
            )
            .await
            .unwrap();
        memory.sign_out(&session).await.unwrap();

        let mut revoked = None;
        for _ in 0..50 {
            revoked = watcher.revoked_at(user.id).await;
            if revoked.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(revoked.is_some());
    }
}
