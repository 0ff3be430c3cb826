use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Movie;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(movie_details))
}

// GET /api/movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT id, title, description, duration_minutes, poster_url, genre, release_date
         FROM movies
         ORDER BY title",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(movies))
}

// Сеанс вместе с названиями кинотеатра и зала, как рисует их страница фильма
#[derive(Debug, Serialize, sqlx::FromRow)]
struct ShowtimeInfo {
    id: i64,
    show_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    price: f64,
    theater_name: String,
    theater_location: Option<String>,
    auditorium_name: String,
}

#[derive(Debug, Serialize)]
struct MovieDetails {
    movie: Movie,
    showtimes: Vec<ShowtimeInfo>,
}

// GET /api/movies/{id}
async fn movie_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = sqlx::query_as::<_, Movie>(
        "SELECT id, title, description, duration_minutes, poster_url, genre, release_date
         FROM movies WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("movie not found"))?;

    let showtimes = sqlx::query_as::<_, ShowtimeInfo>(
        r#"
        SELECT st.id, st.show_date, st.start_time, st.end_time, st.price,
               t.name AS theater_name,
               t.location AS theater_location,
               a.name AS auditorium_name
        FROM showtimes st
        JOIN auditoriums a ON a.id = st.auditorium_id
        JOIN theaters t ON t.id = a.theater_id
        WHERE st.movie_id = $1
        ORDER BY st.show_date, st.start_time
        "#,
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(MovieDetails { movie, showtimes }))
}
