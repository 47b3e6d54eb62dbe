//! Review carousel and review submission (HTMX fragments).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use micrart_core::carousel::{AUTO_ADVANCE, ReviewCarousel};
use micrart_core::display::format_display_date;
use micrart_core::{NewReview, Rating, Review};
use serde::Deserialize;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::state::AppState;

/// Event fired on the page after a review is stored; the carousel listens
/// for it and refreshes.
pub const REVIEW_ADDED_EVENT: &str = "reviewAdded";

/// One review as shown on a carousel slide.
#[derive(Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub comment: String,
    pub rating: String,
    /// Fill percentage of each star, in steps of 10.
    pub star_fills: Vec<u8>,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let rating = review.rating.unwrap_or_default();
        Self {
            user_name: review.user_name.clone(),
            comment: review.comment.clone(),
            rating: rating.to_string(),
            star_fills: rating.star_fills(),
            date: format_display_date(review.created_at),
        }
    }
}

/// Carousel state for one render.
#[derive(Clone)]
pub struct CarouselView {
    pub current: Option<ReviewView>,
    pub index: usize,
    pub previous: usize,
    pub next: usize,
    pub total: usize,
    /// Seconds between automatic advances.
    pub interval_secs: u64,
}

impl CarouselView {
    /// Show the review at `index`, wrapped into range.
    #[must_use]
    pub fn at(reviews: &[Review], index: usize) -> Self {
        let carousel = ReviewCarousel::at(reviews.len(), index);
        Self {
            current: reviews.get(carousel.index()).map(ReviewView::from),
            index: carousel.index(),
            previous: carousel.previous().index(),
            next: carousel.next().index(),
            total: carousel.len(),
            interval_secs: AUTO_ADVANCE.as_secs(),
        }
    }

    /// 1-based position for display.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index + 1
    }
}

/// Review form contents and outcome.
#[derive(Clone, Default)]
pub struct ReviewFormView {
    pub user_name: String,
    pub comment: String,
    pub rating: String,
    pub error: Option<String>,
    pub submitted: bool,
}

impl ReviewFormView {
    /// The typed rating, or zero when it does not parse.
    fn selected(&self) -> Rating {
        Rating::parse(&self.rating).unwrap_or_default()
    }

    /// Star meter fills for the slider's current value.
    #[must_use]
    pub fn star_fills(&self) -> Vec<u8> {
        self.selected().star_fills()
    }

    /// Slider position, in the one-decimal form the slider steps through.
    #[must_use]
    pub fn slider_value(&self) -> String {
        self.selected().to_string()
    }

    fn rejected(form: ReviewForm, error: String) -> Self {
        Self {
            user_name: form.user_name,
            comment: form.comment,
            rating: form.rating,
            error: Some(error),
            submitted: false,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "reviews/carousel.html")]
pub struct CarouselTemplate {
    pub carousel: CarouselView,
}

#[derive(Template, WebTemplate)]
#[template(path = "reviews/form.html")]
pub struct ReviewFormTemplate {
    pub form: ReviewFormView,
}

#[derive(Debug, Deserialize)]
pub struct CarouselQuery {
    pub index: Option<usize>,
}

/// Review form fields. Missing fields arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: String,
}

/// Render the carousel at `index` (HTMX polling and prev/next controls).
#[instrument(skip(state))]
pub async fn carousel(
    State(state): State<AppState>,
    Query(query): Query<CarouselQuery>,
) -> impl IntoResponse {
    let reviews = state.catalog().reviews().await.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch reviews: {e}");
        Default::default()
    });

    CarouselTemplate {
        carousel: CarouselView::at(&reviews, query.index.unwrap_or(0)),
    }
}

/// Validate and store a review.
///
/// Invalid input is answered with the form and its error without touching
/// the backend. A stored review resets the form and fires `reviewAdded`.
#[instrument(skip(state, form), fields(user_name = %form.user_name))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ReviewForm>) -> Response {
    let review = match NewReview::new(&form.user_name, &form.comment, &form.rating) {
        Ok(review) => review,
        Err(e) => {
            tracing::debug!("Rejected review: {e}");
            return ReviewFormTemplate {
                form: ReviewFormView::rejected(form, e.to_string()),
            }
            .into_response();
        }
    };

    match state.catalog().submit_review(&review).await {
        Ok(created) => {
            let review_id = created.id.to_string();
            add_breadcrumb(
                "review",
                "Submitted review",
                Some(&[("review_id", review_id.as_str())]),
            );
            (
                AppendHeaders([("HX-Trigger", REVIEW_ADDED_EVENT)]),
                ReviewFormTemplate {
                    form: ReviewFormView {
                        submitted: true,
                        ..ReviewFormView::default()
                    },
                },
            )
                .into_response()
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to submit review");
            ReviewFormTemplate {
                form: ReviewFormView::rejected(
                    form,
                    "Could not submit your review. Please try again.".to_string(),
                ),
            }
            .into_response()
        }
    }
}
