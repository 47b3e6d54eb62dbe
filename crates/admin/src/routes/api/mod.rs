//! API route handlers for admin.
//!
//! JSON and SSE endpoints used by the admin pages' scripts. All of them
//! answer 401 rather than redirecting when the session is gone.

pub mod events;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(uploads::router())
        .merge(events::router())
}
