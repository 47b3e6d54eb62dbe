//! New-artwork form.
//!
//! Two steps: the crop widget posts the image to `/artworks/image` and gets
//! back its public URL, then the form posts title, description, and that
//! URL to `/artworks`. No row is written without an uploaded image.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use micrart_core::NewArtwork;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{AdminSession, keys};
use crate::routes::dashboard::DASHBOARD_PATH;
use crate::routes::images::{
    AspectOption, ImageTarget, StoredImage, artwork_object_name, aspect_options, now_millis,
    read_image_upload, store,
};
use crate::state::AppState;

/// Values echoed back into the form.
#[derive(Debug, Clone, Default)]
pub struct ArtworkFormView {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub error: Option<String>,
}

/// New artwork page.
#[derive(Template, WebTemplate)]
#[template(path = "artworks/new.html")]
pub struct NewArtworkTemplate {
    pub admin_name: String,
    pub form: ArtworkFormView,
    pub aspects: Vec<AspectOption>,
}

impl NewArtworkTemplate {
    fn new(admin: &AdminSession, form: ArtworkFormView) -> Self {
        Self {
            admin_name: admin.user().display_name().to_string(),
            form,
            aspects: aspect_options(),
        }
    }
}

/// Artwork form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArtworkForm {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

/// Build the artworks router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/artworks/new", get(new_artwork))
        .route(
            "/artworks/image",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/artworks", post(create))
}

/// GET /artworks/new
async fn new_artwork(RequireAdminAuth(admin): RequireAdminAuth) -> NewArtworkTemplate {
    NewArtworkTemplate::new(&admin, ArtworkFormView::default())
}

/// Crop and store an artwork image.
///
/// POST /artworks/image
#[instrument(skip_all)]
async fn upload_image(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Json<StoredImage>> {
    let upload = read_image_upload(multipart).await?;
    let target = ImageTarget {
        bucket: &state.config().artwork_bucket,
        object_name: artwork_object_name(now_millis()),
        upsert: false,
    };
    Ok(Json(store(&state, &admin, upload, target).await?))
}

/// Insert the artwork row.
///
/// POST /artworks
#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<ArtworkForm>,
) -> Result<Response> {
    let rejected = |form: ArtworkForm, err: &AppError| {
        let view = ArtworkFormView {
            title: form.title,
            description: form.description,
            image_url: form.image_url,
            error: Some(err.user_message()),
        };
        (err.status(), NewArtworkTemplate::new(&admin, view)).into_response()
    };

    let artwork = match NewArtwork::new(&form.title, &form.description, Some(&form.image_url)) {
        Ok(artwork) => artwork,
        Err(e) => return Ok(rejected(form, &e.into())),
    };

    let created = match state
        .backend()
        .artworks()
        .create(&artwork, &admin.auth.access_token)
        .await
    {
        Ok(created) => created,
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            return Ok(rejected(form, &err));
        }
    };

    tracing::info!(artwork_id = %created.id, "Artwork created");
    session
        .insert(keys::FLASH, format!("Artwork \"{}\" created.", created.title))
        .await?;
    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}
