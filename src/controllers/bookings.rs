use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::Row;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::services::booking::{self, CreateBookingRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings", get(get_user_bookings))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation =
        booking::create_booking(&state.db.pool, &req, claims.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

#[derive(Debug, Serialize)]
struct BookingSeatResponse {
    id: i64,
    row_label: String,
    seat_number: i32,
    ticket_type: String,
    price: f64,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: i64,
    showtime_id: i64,
    status: String,
    total_amount: f64,
    seats: Vec<BookingSeatResponse>,
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query(
        r#"
        SELECT b.id AS bid, b.showtime_id AS stid, b.status, b.total_amount,
               s.id AS sid, s.row_label, s.seat_number,
               bs.ticket_type, bs.price
        FROM bookings b
        JOIN booking_seats bs ON bs.booking_id = b.id
        JOIN seats s ON s.id = bs.seat_id
        WHERE b.user_id = $1
        ORDER BY b.created_at DESC, s.row_label, s.seat_number
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_user_bookings sql error: {:?}", e);
        ApiError::from(e)
    })?;

    use std::collections::BTreeMap;
    let mut map: BTreeMap<i64, BookingResponse> = BTreeMap::new();
    for r in rows {
        let bid: i64 = r.get("bid");
        let entry = map.entry(bid).or_insert_with(|| BookingResponse {
            id: bid,
            showtime_id: r.get("stid"),
            status: r.get("status"),
            total_amount: r.get("total_amount"),
            seats: Vec::new(),
        });
        entry.seats.push(BookingSeatResponse {
            id: r.get("sid"),
            row_label: r.get("row_label"),
            seat_number: r.get("seat_number"),
            ticket_type: r.get("ticket_type"),
            price: r.get("price"),
        });
    }

    // Новые брони первыми
    let resp: Vec<BookingResponse> = map.into_values().rev().collect();

    Ok((StatusCode::OK, Json(resp)))
}
