//! HTTP route handlers for the gallery.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Gallery, review carousel, review form
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Artworks
//! GET  /artwork/{id}           - Artwork detail
//!
//! # Blog
//! GET  /blog                   - Post listing (?q= pre-filters)
//! GET  /blog/search            - Results fragment (HTMX, every keystroke)
//! GET  /blog/{slug}            - Post detail
//!
//! # Reviews (HTMX fragments)
//! GET  /reviews/carousel       - Carousel at ?index=N (polled every 8 s)
//! POST /reviews                - Submit review (rate limited, fires reviewAdded)
//! ```

pub mod artworks;
pub mod blog;
pub mod home;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::review_rate_limiter;
use crate::state::AppState;

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/search", get(blog::search))
        .route("/{slug}", get(blog::show))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(reviews::submit))
        .layer(review_rate_limiter())
        .route("/carousel", get(reviews::carousel))
}

/// Create all routes for the gallery.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/artwork/{id}", get(artworks::show))
        .nest("/blog", blog_routes())
        .nest("/reviews", review_routes())
}
