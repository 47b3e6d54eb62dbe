//! Artwork detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use micrart_core::display::format_display_date;
use micrart_core::{Artwork, ArtworkId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Everything the detail page shows about one artwork.
#[derive(Clone)]
pub struct ArtworkDetail {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub date: String,
}

impl From<&Artwork> for ArtworkDetail {
    fn from(artwork: &Artwork) -> Self {
        Self {
            title: artwork.title.clone(),
            description: artwork.description.clone(),
            image_url: artwork.image_url.clone(),
            date: format_display_date(artwork.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "artworks/show.html")]
pub struct ArtworkTemplate {
    pub artwork: ArtworkDetail,
}

/// Show one artwork. Unknown or malformed ids get the 404 page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<ArtworkTemplate> {
    let id: ArtworkId = id
        .parse()
        .map_err(|_| AppError::NotFound("artwork".to_string()))?;

    let artwork = state
        .catalog()
        .artwork(id)
        .await?
        .ok_or_else(|| AppError::NotFound("artwork".to_string()))?;

    Ok(ArtworkTemplate {
        artwork: ArtworkDetail::from(artwork.as_ref()),
    })
}
