//! Server-sent event streams for open admin pages.
//!
//! - `GET /api/session/stream` emits `signed_out` once the page's session
//!   is revoked, expires, or fails to refresh, so the page can navigate to
//!   login.
//! - `GET /api/dashboard/counts/stream` emits `counts` on connect, whenever
//!   an artwork or blog post is inserted, and every 30 seconds.
//!
//! Each stream lives exactly as long as the page's `EventSource`.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tower_sessions::Session;
use uuid::Uuid;

use micrart_backend::AuthEvent;

use crate::middleware::{RequireAdminAuth, resolve_stored};
use crate::routes::dashboard::{counts_affected, fetch_counts};
use crate::state::AppState;

/// Event name sent when the session is gone.
pub const SIGNED_OUT_EVENT: &str = "signed_out";
/// Event name carrying dashboard counts.
pub const COUNTS_EVENT: &str = "counts";
/// Counts are re-fetched at least this often.
pub const COUNTS_REFRESH: Duration = Duration::from_secs(30);
/// How often an open session stream re-resolves its session, catching
/// expiry and failed refreshes that publish no auth event.
pub const SESSION_RECHECK: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session/stream", get(session_stream))
        .route("/api/dashboard/counts/stream", get(counts_stream))
}

/// Whether `event` ends a session of `user_id` issued at `issued_at`.
#[must_use]
pub fn ends_session(event: &AuthEvent, user_id: Uuid, issued_at: DateTime<Utc>) -> bool {
    matches!(
        event,
        AuthEvent::SignedOut { user_id: id, at } if *id == user_id && issued_at <= *at
    )
}

/// GET /api/session/stream
async fn session_stream(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the first check so no sign-out slips in between.
    let mut events = state.backend().auth.subscribe();
    let session_id = session.id();
    let user_id = admin.user().id;
    let issued_at = admin.issued_at;

    let stream = async_stream::stream! {
        let mut gone = revoked(&state, user_id, issued_at).await;
        let mut recheck =
            tokio::time::interval_at(Instant::now() + SESSION_RECHECK, SESSION_RECHECK);
        while !gone {
            gone = tokio::select! {
                _ = recheck.tick() => resolve_stored(&state, session_id).await.is_none(),
                event = events.recv() => match event {
                    Ok(event) => ends_session(&event, user_id, issued_at),
                    // Missed events may include the sign-out; ask the watcher.
                    Err(RecvError::Lagged(_)) => revoked(&state, user_id, issued_at).await,
                    Err(RecvError::Closed) => break,
                },
            };
        }
        if gone {
            tracing::debug!(%user_id, "Notifying page of sign-out");
            yield Ok(Event::default().event(SIGNED_OUT_EVENT).data("{}"));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn revoked(state: &AppState, user_id: Uuid, issued_at: DateTime<Utc>) -> bool {
    state
        .watcher()
        .revoked_at(user_id)
        .await
        .is_some_and(|at| issued_at <= at)
}

enum Wake {
    Refresh,
    Skip,
    Closed,
}

/// GET /api/dashboard/counts/stream
async fn counts_stream(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut changes = state.backend().database.subscribe_changes();
    let session_id = session.id();

    let stream = async_stream::stream! {
        // First tick fires immediately, giving the page its initial counts.
        let mut ticker = tokio::time::interval(COUNTS_REFRESH);
        loop {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Refresh,
                change = changes.recv() => match change {
                    Ok(change) if counts_affected(change.table) => Wake::Refresh,
                    Ok(_) => Wake::Skip,
                    Err(RecvError::Lagged(_)) => Wake::Refresh,
                    Err(RecvError::Closed) => Wake::Closed,
                },
            };
            match wake {
                Wake::Refresh => {}
                Wake::Skip => continue,
                Wake::Closed => break,
            }

            // Count with the session's current token; a signed-out page gets no more.
            let Some(admin) = resolve_stored(&state, session_id).await else {
                break;
            };
            let counts = fetch_counts(state.backend(), &admin.auth.access_token).await;
            match Event::default().event(COUNTS_EVENT).json_data(counts) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!(error = %e, "Failed to encode dashboard counts"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_sign_out_of_same_user_after_issue_ends_session() {
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let event = AuthEvent::SignedOut {
            user_id,
            at: issued_at + TimeDelta::seconds(1),
        };
        assert!(ends_session(&event, user_id, issued_at));
    }

    #[test]
    fn test_other_events_do_not_end_session() {
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();

        let other_user = AuthEvent::SignedOut {
            user_id: Uuid::new_v4(),
            at: issued_at,
        };
        let earlier = AuthEvent::SignedOut {
            user_id,
            at: issued_at - TimeDelta::minutes(1),
        };
        let refreshed = AuthEvent::TokenRefreshed {
            user_id,
            at: issued_at,
        };

        assert!(!ends_session(&other_user, user_id, issued_at));
        assert!(!ends_session(&earlier, user_id, issued_at));
        assert!(!ends_session(&refreshed, user_id, issued_at));
    }
}
