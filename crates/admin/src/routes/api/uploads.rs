//! Simulated upload progress polling.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use micrart_core::progress::SimulatedProgress;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/uploads/{id}", get(progress))
}

/// GET /api/uploads/{id}
///
/// `{"percent": 45, "state": "in_flight", "simulated": true}`
async fn progress(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SimulatedProgress>> {
    state
        .uploads()
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("upload {id}")))
}
