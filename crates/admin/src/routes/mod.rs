//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (backend count)
//!
//! # Auth
//! GET  /auth/login                      - Login page (redirects if signed in)
//! POST /auth/login                      - Email + password sign-in (rate limited)
//! POST /auth/logout                     - Sign out everywhere
//!
//! # Dashboard
//! GET  /                                - Redirect to /dashboard
//! GET  /dashboard                       - Artwork and blog post counts
//!
//! # Artworks
//! GET  /artworks/new                    - New artwork form with crop widget
//! POST /artworks/image                  - Crop + upload image, returns JSON URL
//! POST /artworks                        - Insert artwork row
//!
//! # Blog posts
//! GET  /blogs/new                       - New post form with crop widget
//! POST /blogs/image                     - Crop + upload cover, returns JSON URL
//! POST /blogs                           - Insert post row
//!
//! # API
//! GET  /api/uploads/{id}                - Simulated upload progress
//! GET  /api/session/stream              - SSE: `signed_out`
//! GET  /api/dashboard/counts/stream     - SSE: `counts`
//! ```
//!
//! Every route except login and health requires [`RequireAdminAuth`].
//!
//! [`RequireAdminAuth`]: crate::middleware::RequireAdminAuth

pub mod api;
pub mod artworks;
pub mod auth;
pub mod blogs;
pub mod dashboard;
pub mod images;

use axum::Router;

use crate::config::AdminConfig;
use crate::state::AppState;

/// Build the complete router for admin.
pub fn routes(config: &AdminConfig) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(artworks::router(config.max_upload_bytes))
        .merge(blogs::router(config.max_upload_bytes))
        .merge(api::router())
}
