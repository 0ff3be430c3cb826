use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::availability;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/showtimes/{id}/seats", get(showtime_seats))
}

// GET /api/showtimes/{id}/seats
async fn showtime_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let seats = availability::seat_availability(&state.db.pool, id).await?;
    Ok(Json(seats))
}
