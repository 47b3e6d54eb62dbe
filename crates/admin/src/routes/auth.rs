//! Authentication route handlers for admin.
//!
//! Email and password sign-in against the auth service. The session stores
//! the returned tokens; see [`crate::middleware::auth`] for the guard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use micrart_core::Email;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{LOGIN_PATH, login_rate_limiter, resolve};
use crate::models::{AdminSession, keys};
use crate::routes::dashboard::DASHBOARD_PATH;
use crate::state::AppState;

/// Shortest password sent to the auth service.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, post(login))
        .layer(login_rate_limiter())
        .route(LOGIN_PATH, get(login_page))
        .route("/auth/logout", post(logout))
}

fn login_error(status: StatusCode, email: &str, message: impl Into<String>) -> Response {
    (
        status,
        LoginTemplate {
            email: email.trim().to_string(),
            error: Some(message.into()),
        },
    )
        .into_response()
}

/// Check the form before any network call.
fn validate_login(form: &LoginForm) -> std::result::Result<Email, String> {
    let email = Email::parse(&form.email).map_err(|e| e.to_string())?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    Ok(email)
}

/// Render the login page, or skip it when already signed in.
///
/// GET /auth/login
async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    if resolve(&state, &session).await.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    LoginTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Sign in with email and password.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match validate_login(&form) {
        Ok(email) => email,
        Err(message) => {
            return Ok(login_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                &form.email,
                message,
            ));
        }
    };
    let password = SecretString::from(form.password);

    let auth = match state
        .backend()
        .auth
        .sign_in_with_password(&email, &password)
        .await
    {
        Ok(auth) => auth,
        Err(e) if e.is_auth() => {
            tracing::info!("Admin sign-in rejected");
            return Ok(login_error(
                StatusCode::UNAUTHORIZED,
                email.as_str(),
                "Invalid email or password.",
            ));
        }
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            return Ok(login_error(
                err.status(),
                email.as_str(),
                err.user_message(),
            ));
        }
    };

    // New identity, new session id
    session.cycle_id().await?;
    let admin = AdminSession::new(auth, Utc::now());
    session.insert(keys::ADMIN_SESSION, &admin).await?;

    set_sentry_user(admin.user());
    tracing::info!(user_id = %admin.user().id, "Admin signed in");

    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}

/// Sign out everywhere and clear the session.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Ok(Some(admin)) = session.get::<AdminSession>(keys::ADMIN_SESSION).await {
        if let Err(e) = state.backend().auth.sign_out(&admin.auth).await {
            tracing::warn!(error = %e, "Auth service sign-out failed");
        }
        tracing::info!(user_id = %admin.user().id, "Admin signed out");
    }
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush admin session");
    }
    clear_sentry_user();

    Redirect::to(LOGIN_PATH)
}
