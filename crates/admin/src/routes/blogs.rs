//! New-blog-post form.
//!
//! Same two-step flow as artworks: the cover image is cropped and stored
//! first, then the post row is inserted with its URL. The slug is derived
//! from the title once, here; a title whose slug is already taken is
//! rejected rather than suffixed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use micrart_core::NewBlogPost;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{AdminSession, keys};
use crate::routes::dashboard::DASHBOARD_PATH;
use crate::routes::images::{
    AspectOption, ImageTarget, StoredImage, aspect_options, blog_object_name, now_millis,
    read_image_upload, store,
};
use crate::state::AppState;

/// Shown when another post already uses the derived slug.
pub const SLUG_TAKEN: &str = "A post with this title already exists. Please choose another title.";

/// Values echoed back into the form.
#[derive(Debug, Clone, Default)]
pub struct BlogFormView {
    pub title: String,
    pub content: String,
    pub cover_image_url: String,
    pub tags: String,
    pub author: String,
    pub error: Option<String>,
}

/// New blog post page.
#[derive(Template, WebTemplate)]
#[template(path = "blogs/new.html")]
pub struct NewBlogTemplate {
    pub admin_name: String,
    pub form: BlogFormView,
    pub aspects: Vec<AspectOption>,
}

impl NewBlogTemplate {
    fn new(admin: &AdminSession, form: BlogFormView) -> Self {
        Self {
            admin_name: admin.user().display_name().to_string(),
            form,
            aspects: aspect_options(),
        }
    }
}

/// Blog form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogForm {
    pub title: String,
    pub content: String,
    pub cover_image_url: String,
    pub tags: String,
    pub author: String,
}

impl BlogForm {
    fn into_view(self, error: String) -> BlogFormView {
        BlogFormView {
            title: self.title,
            content: self.content,
            cover_image_url: self.cover_image_url,
            tags: self.tags,
            author: self.author,
            error: Some(error),
        }
    }
}

/// Build the blogs router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/blogs/new", get(new_blog))
        .route(
            "/blogs/image",
            post(upload_cover).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/blogs", post(create))
}

/// GET /blogs/new
async fn new_blog(RequireAdminAuth(admin): RequireAdminAuth) -> NewBlogTemplate {
    NewBlogTemplate::new(&admin, BlogFormView::default())
}

/// Crop and store a cover image.
///
/// POST /blogs/image
#[instrument(skip_all)]
async fn upload_cover(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Json<StoredImage>> {
    let upload = read_image_upload(multipart).await?;
    let target = ImageTarget {
        bucket: &state.config().blog_image_bucket,
        object_name: blog_object_name(now_millis(), upload.file_name.as_deref()),
        upsert: true,
    };
    Ok(Json(store(&state, &admin, upload, target).await?))
}

/// Insert the post row.
///
/// POST /blogs
#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<BlogForm>,
) -> Result<Response> {
    let rejected = |form: BlogForm, status: StatusCode, message: String| {
        (status, NewBlogTemplate::new(&admin, form.into_view(message))).into_response()
    };

    let author = if form.author.trim().is_empty() {
        admin.user().display_name()
    } else {
        form.author.as_str()
    };
    let post = match NewBlogPost::new(
        &form.title,
        &form.content,
        Some(&form.cover_image_url),
        &form.tags,
        Some(author),
    ) {
        Ok(post) => post,
        Err(e) => {
            let err = AppError::from(e);
            return Ok(rejected(form, err.status(), err.user_message()));
        }
    };

    let posts = state.backend().blog_posts();
    let result = match posts.slug_exists(post.slug(), &admin.auth.access_token).await {
        Ok(true) => {
            tracing::info!(slug = %post.slug(), "Blog slug already taken");
            return Ok(rejected(
                form,
                StatusCode::UNPROCESSABLE_ENTITY,
                SLUG_TAKEN.to_string(),
            ));
        }
        Ok(false) => posts.create(&post, &admin.auth.access_token).await,
        Err(e) => Err(e),
    };

    let created = match result {
        Ok(created) => created,
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            return Ok(rejected(form, err.status(), err.user_message()));
        }
    };

    tracing::info!(post_id = %created.id, slug = %created.slug, "Blog post created");
    session
        .insert(keys::FLASH, format!("Post \"{}\" published.", created.title))
        .await?;
    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}
