//! Authentication guard for admin routes.
//!
//! Every admin page and API call resolves the stored session once:
//!
//! ```text
//! Checking ─┬─ session valid ─────────────────────────► Authenticated
//!           ├─ token near expiry ─ refresh ok ────────► Authenticated
//!           │                    └ refresh failed ───┐
//!           ├─ signed out since issue ───────────────┤
//!           └─ no session ───────────────────────────┴► RedirectingToLogin
//! ```

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use tower_sessions::Session;
use tower_sessions::session::Id;

use crate::error::set_sentry_user;
use crate::middleware::session::reload;
use crate::models::{AdminSession, keys};
use crate::state::AppState;

/// Path unauthenticated page requests are sent to.
pub const LOGIN_PATH: &str = "/auth/login";

/// What the guard decided about a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Authenticated,
    NeedsRefresh,
    /// The user signed out (anywhere) after this session was issued.
    Revoked,
    Missing,
}

/// Decide what to do with a stored session.
///
/// `revoked_at` is the latest sign-out recorded for the session's user.
#[must_use]
pub fn evaluate(
    session: Option<&AdminSession>,
    revoked_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> GuardOutcome {
    let Some(session) = session else {
        return GuardOutcome::Missing;
    };
    if revoked_at.is_some_and(|at| session.issued_at <= at) {
        return GuardOutcome::Revoked;
    }
    if session.auth.needs_refresh(now) {
        return GuardOutcome::NeedsRefresh;
    }
    GuardOutcome::Authenticated
}

/// Resolve the session to a signed-in admin, refreshing tokens if needed.
///
/// Sessions that are revoked or fail to refresh are flushed.
pub async fn resolve(state: &AppState, session: &Session) -> Option<AdminSession> {
    let stored = stored(session).await;
    let revoked_at = match &stored {
        Some(admin) => state.watcher().revoked_at(admin.user().id).await,
        None => None,
    };

    match evaluate(stored.as_ref(), revoked_at, Utc::now()) {
        GuardOutcome::Authenticated => stored,
        GuardOutcome::NeedsRefresh => match stored {
            Some(admin) => refresh(state, session, admin).await,
            None => None,
        },
        GuardOutcome::Revoked => {
            tracing::info!("Admin session revoked by sign-out");
            flush(session).await;
            None
        }
        GuardOutcome::Missing => None,
    }
}

/// Resolve session `id` as currently held in the session store.
///
/// For responses that outlive their request. A refresh is written back to
/// the store straight away since no response is left to carry it.
pub async fn resolve_stored(state: &AppState, id: Option<Id>) -> Option<AdminSession> {
    let session = reload(state.sessions(), id);
    let expires_before = stored(&session).await.map(|admin| admin.auth.expires_at);
    let admin = resolve(state, &session).await?;
    if expires_before != Some(admin.auth.expires_at) {
        if let Err(e) = session.save().await {
            tracing::warn!(error = %e, "Failed to save refreshed admin session");
        }
    }
    Some(admin)
}

async fn stored(session: &Session) -> Option<AdminSession> {
    match session.get(keys::ADMIN_SESSION).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read admin session");
            None
        }
    }
}

async fn refresh(state: &AppState, session: &Session, admin: AdminSession) -> Option<AdminSession> {
    match state.backend().auth.refresh(&admin.auth.refresh_token).await {
        Ok(auth) => {
            let refreshed = admin.refreshed(auth);
            if let Err(e) = session.insert(keys::ADMIN_SESSION, &refreshed).await {
                tracing::warn!(error = %e, "Failed to store refreshed admin session");
            }
            tracing::debug!(user_id = %refreshed.user().id, "Admin session refreshed");
            Some(refreshed)
        }
        Err(e) => {
            tracing::info!(error = %e, "Admin session refresh failed");
            flush(session).await;
            None
        }
    }
}

async fn flush(session: &Session) {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush admin session");
    }
}

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.user().display_name())
/// }
/// ```
pub struct RequireAdminAuth(pub AdminSession);

/// Error returned when admin authentication is required but the user is not logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AdminAuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let rejection = AdminAuthRejection::for_path(parts.uri.path());

        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = resolve(state, &session).await.ok_or(rejection)?;
        set_sentry_user(admin.user());
        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use micrart_backend::{
        AccessToken, AuthService, AuthSession, Backend, MemoryBackend, RefreshToken,
        SupabaseConfig,
    };
    use micrart_core::{AdminUser, Email};
    use secrecy::SecretString;
    use url::Url;
    use uuid::Uuid;

    use crate::config::AdminConfig;

    use super::*;

    fn admin_session(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> AdminSession {
        AdminSession::new(
            AuthSession {
                access_token: AccessToken::new("access"),
                refresh_token: RefreshToken::new("refresh"),
                expires_at,
                user: AdminUser {
                    id: Uuid::new_v4(),
                    email: Some("admin@micrart.test".to_string()),
                },
            },
            issued_at,
        )
    }

    #[test]
    fn test_missing_session() {
        assert_eq!(evaluate(None, None, Utc::now()), GuardOutcome::Missing);
    }

    #[test]
    fn test_live_session_is_authenticated() {
        let now = Utc::now();
        let session = admin_session(now, now + TimeDelta::hours(1));
        assert_eq!(
            evaluate(Some(&session), None, now),
            GuardOutcome::Authenticated
        );
    }

    #[test]
    fn test_expiring_token_needs_refresh() {
        let now = Utc::now();
        let session = admin_session(now - TimeDelta::hours(1), now + TimeDelta::seconds(5));
        assert_eq!(
            evaluate(Some(&session), None, now),
            GuardOutcome::NeedsRefresh
        );
    }

    #[test]
    fn test_sign_out_revokes_older_sessions_only() {
        let now = Utc::now();
        let expires = now + TimeDelta::hours(1);
        let older = admin_session(now - TimeDelta::minutes(10), expires);
        let newer = admin_session(now, expires);
        let signed_out = now - TimeDelta::minutes(5);

        assert_eq!(
            evaluate(Some(&older), Some(signed_out), now),
            GuardOutcome::Revoked
        );
        assert_eq!(
            evaluate(Some(&newer), Some(signed_out), now),
            GuardOutcome::Authenticated
        );
    }

    #[test]
    fn test_revocation_wins_over_refresh() {
        let now = Utc::now();
        let session = admin_session(now - TimeDelta::hours(2), now);
        assert_eq!(
            evaluate(Some(&session), Some(now - TimeDelta::hours(1)), now),
            GuardOutcome::Revoked
        );
    }

    async fn stored_state(ttl: TimeDelta) -> (MemoryBackend, AppState, Session) {
        let memory = MemoryBackend::new();
        memory.add_admin("admin@micrart.test", "hunter22").await;
        memory.set_token_ttl(ttl).await;
        let auth = memory
            .sign_in_with_password(
                &Email::parse("admin@micrart.test").unwrap(),
                &SecretString::from("hunter22"),
            )
            .await
            .unwrap();
        let state = AppState::new(
            AdminConfig::local(SupabaseConfig {
                url: Url::parse("https://abcd.supabase.co").unwrap(),
                anon_key: SecretString::from("key"),
                schema: SupabaseConfig::DEFAULT_SCHEMA.to_string(),
            }),
            Backend::in_memory(&memory),
        );

        let session = reload(state.sessions(), None);
        session
            .insert(keys::ADMIN_SESSION, AdminSession::new(auth, Utc::now()))
            .await
            .unwrap();
        session.save().await.unwrap();
        (memory, state, session)
    }

    #[tokio::test]
    async fn test_resolve_stored_saves_refreshed_tokens() {
        let (_memory, state, session) = stored_state(TimeDelta::seconds(10)).await;
        let before: AdminSession = session.get(keys::ADMIN_SESSION).await.unwrap().unwrap();

        let admin = resolve_stored(&state, session.id()).await.unwrap();
        assert!(admin.auth.expires_at > before.auth.expires_at);

        let reloaded = reload(state.sessions(), session.id());
        let after: AdminSession = reloaded.get(keys::ADMIN_SESSION).await.unwrap().unwrap();
        assert_eq!(after.auth.expires_at, admin.auth.expires_at);
        assert_eq!(after.issued_at, before.issued_at);
    }

    #[tokio::test]
    async fn test_resolve_stored_sees_flush_by_another_request() {
        let (_memory, state, session) = stored_state(TimeDelta::hours(1)).await;
        let snapshot = reload(state.sessions(), session.id());
        assert!(resolve(&state, &snapshot).await.is_some());

        session.flush().await.unwrap();

        assert!(resolve(&state, &snapshot).await.is_some());
        assert!(resolve_stored(&state, session.id()).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_stored_flushes_when_refresh_fails() {
        let (memory, state, session) = stored_state(TimeDelta::seconds(10)).await;
        let admin: AdminSession = session.get(keys::ADMIN_SESSION).await.unwrap().unwrap();
        // Spend the refresh token elsewhere.
        memory.refresh(&admin.auth.refresh_token).await.unwrap();

        assert!(resolve_stored(&state, session.id()).await.is_none());
        let reloaded = reload(state.sessions(), session.id());
        let gone: Option<AdminSession> = reloaded.get(keys::ADMIN_SESSION).await.unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn test_rejection_depends_on_path() {
        assert_eq!(
            AdminAuthRejection::for_path("/api/uploads/1"),
            AdminAuthRejection::Unauthorized
        );
        assert_eq!(
            AdminAuthRejection::for_path("/dashboard"),
            AdminAuthRejection::RedirectToLogin
        );
        let response = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }
}
