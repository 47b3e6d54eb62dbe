//! Home page: artwork gallery, review carousel, and review form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use micrart_core::Artwork;
use micrart_core::display::{excerpt, format_display_date};
use tracing::instrument;

use super::reviews::{CarouselView, ReviewFormView};
use crate::filters;
use crate::state::AppState;

const CARD_EXCERPT_CHARS: usize = 120;

/// An artwork tile in the gallery grid.
#[derive(Clone)]
pub struct ArtworkCard {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub summary: Option<String>,
    pub date: String,
}

impl From<&Artwork> for ArtworkCard {
    fn from(artwork: &Artwork) -> Self {
        Self {
            id: artwork.id.as_i64(),
            title: artwork.title.clone(),
            image_url: artwork.image_url.clone(),
            summary: artwork
                .description
                .as_deref()
                .map(|text| excerpt(text, CARD_EXCERPT_CHARS)),
            date: format_display_date(artwork.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub artworks: Vec<ArtworkCard>,
    pub carousel: CarouselView,
    pub form: ReviewFormView,
}

/// Gallery landing page.
///
/// A failed fetch renders that section empty and is logged.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let (artworks, reviews) = (
        state.catalog().artworks().await,
        state.catalog().reviews().await,
    );

    let artworks = artworks.map_or_else(
        |e| {
            tracing::error!("Failed to fetch artworks: {e}");
            Vec::new()
        },
        |artworks| artworks.iter().map(ArtworkCard::from).collect(),
    );

    let reviews = reviews.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch reviews: {e}");
        Default::default()
    });

    HomeTemplate {
        artworks,
        carousel: CarouselView::at(&reviews, 0),
        form: ReviewFormView::default(),
    }
}
