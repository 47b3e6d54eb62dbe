//! Dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::Redirect, routing::get};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use micrart_backend::{AccessToken, Backend, Table};

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::keys;
use crate::state::AppState;

/// Where admins land after signing in.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Content totals shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub artworks: u64,
    pub blog_posts: u64,
}

/// Whether a change to `table` moves the dashboard counts.
#[must_use]
pub const fn counts_affected(table: Table) -> bool {
    matches!(table, Table::Artworks | Table::BlogPosts)
}

/// Fetch both counts concurrently as the admin `auth`. A failed count
/// shows as zero.
pub async fn fetch_counts(backend: &Backend, auth: &AccessToken) -> DashboardCounts {
    let artworks = backend.artworks();
    let blog_posts = backend.blog_posts();
    let (artworks, blog_posts) =
        tokio::join!(artworks.count(Some(auth)), blog_posts.count(Some(auth)));

    DashboardCounts {
        artworks: artworks.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to count artworks");
            0
        }),
        blog_posts: blog_posts.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to count blog posts");
            0
        }),
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub counts: DashboardCounts,
    pub flash: Option<String>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(DASHBOARD_PATH, get(dashboard))
}

/// GET /
async fn index(RequireAdminAuth(_admin): RequireAdminAuth) -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

/// GET /dashboard
#[instrument(skip_all)]
async fn dashboard(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> DashboardTemplate {
    let flash = session
        .remove::<String>(keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        });

    DashboardTemplate {
        admin_name: admin.user().display_name().to_string(),
        counts: fetch_counts(state.backend(), &admin.auth.access_token).await,
        flash,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use micrart_backend::{AuthService, MemoryBackend};
    use micrart_core::Email;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    async fn signed_in(memory: &MemoryBackend) -> AccessToken {
        memory.add_admin("admin@micrart.test", "hunter22").await;
        memory
            .sign_in_with_password(
                &Email::parse("admin@micrart.test").unwrap(),
                &SecretString::from("hunter22"),
            )
            .await
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn test_fetch_counts() {
        let memory = MemoryBackend::new();
        memory
            .seed(Table::Artworks, json!({ "title": "Chalk tower", "image_url": "u" }))
            .await;
        memory
            .seed(Table::BlogPosts, json!({ "title": "Notes", "published": true }))
            .await;
        memory
            .seed(Table::BlogPosts, json!({ "title": "Draft", "published": false }))
            .await;

        let token = signed_in(&memory).await;

        let counts = fetch_counts(&Backend::in_memory(&memory), &token).await;
        assert_eq!(
            counts,
            DashboardCounts {
                artworks: 1,
                blog_posts: 2
            }
        );
    }

    #[tokio::test]
    async fn test_failed_counts_render_as_zero() {
        let memory = MemoryBackend::new();
        memory
            .seed(Table::Artworks, json!({ "title": "Chalk tower", "image_url": "u" }))
            .await;
        let token = signed_in(&memory).await;
        memory.fail_counts(true);

        let counts = fetch_counts(&Backend::in_memory(&memory), &token).await;
        assert_eq!(counts, DashboardCounts::default());
    }

    #[test]
    fn test_reviews_do_not_move_counts() {
        assert!(counts_affected(Table::Artworks));
        assert!(counts_affected(Table::BlogPosts));
        assert!(!counts_affected(Table::Reviews));
    }

    #[test]
    fn test_counts_serialize_for_the_stream() {
        let counts = DashboardCounts {
            artworks: 3,
            blog_posts: 1,
        };
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"artworks":3,"blog_posts":1}"#
        );
    }
}
