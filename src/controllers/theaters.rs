use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{Auditorium, Theater};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/theaters", get(list_theaters))
}

#[derive(Debug, Serialize)]
struct TheaterResponse {
    #[serde(flatten)]
    theater: Theater,
    auditoriums: Vec<Auditorium>,
}

// GET /api/theaters
async fn list_theaters(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let theaters =
        sqlx::query_as::<_, Theater>("SELECT id, name, location FROM theaters ORDER BY name")
            .fetch_all(&state.db.pool)
            .await?;

    let auditoriums = sqlx::query_as::<_, Auditorium>(
        "SELECT id, theater_id, name FROM auditoriums ORDER BY theater_id, name",
    )
    .fetch_all(&state.db.pool)
    .await?;

    let resp: Vec<TheaterResponse> = theaters
        .into_iter()
        .map(|theater| {
            let auditoriums = auditoriums
                .iter()
                .filter(|a| a.theater_id == theater.id)
                .cloned()
                .collect();
            TheaterResponse { theater, auditoriums }
        })
        .collect();

    Ok(Json(resp))
}
