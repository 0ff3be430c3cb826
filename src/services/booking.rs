//! booking.rs
//!
//! Транзакционное ядро бронирования. Вся последовательность
//! проверка-цена-запись выполняется в одной транзакции: либо появляются
//! бронь и все её строки мест, либо ничего.
//!
//! Сериализация конкурирующих броней — через row-level блокировку строк
//! `seats` (`SELECT ... FOR UPDATE`): два запроса с пересекающимися местами
//! выстраиваются на первой общей строке, проигравший видит уже
//! закоммиченные строки победителя и получает `Conflict`.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::models::booking::{TicketType, STATUS_CONFIRMED};
use crate::models::{Seat, Showtime};
use crate::services::identity;

/// Детский билет — фиксированная доля взрослой цены сеанса.
pub const CHILD_PRICE_MULTIPLIER: f64 = 0.7;

// Ожидание блокировок ограничено: лучше вернуть 500 и дать клиенту
// повторить, чем висеть. Частичного состояния после отказа не остаётся.
const LOCK_TIMEOUT: &str = "5s";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub showtime_id: i64,
    #[validate(length(min = 1, message = "at least one seat is required"))]
    pub seats: Vec<i64>,
    #[serde(default)]
    pub ticket_type: TicketType,
    #[validate(email(message = "userEmail must be a valid email address"))]
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: i64,
    pub total: f64,
}

/// Создаёт одну бронь на все запрошенные места сеанса.
///
/// Ошибки: `InvalidInput` (форма запроса, неизвестный сеанс/место),
/// `Conflict` (гонка за места, с их списком), `Internal` (хранилище или
/// таймаут блокировки). Любая ошибка после начала транзакции приводит к
/// полному откату — транзакция откатывается при drop.
pub async fn create_booking(
    pool: &PgPool,
    req: &CreateBookingRequest,
    claim: Option<&Claims>,
) -> Result<BookingConfirmation, ApiError> {
    validate_request(req)?;

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("SET LOCAL lock_timeout = '{}'", LOCK_TIMEOUT))
        .execute(&mut *tx)
        .await?;

    let showtime = sqlx::query_as::<_, Showtime>("SELECT * FROM showtimes WHERE id = $1")
        .bind(req.showtime_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::invalid_input("showtime does not exist"))?;

    // Берём блокировки в фиксированном порядке (id ASC), чтобы два
    // пересекающихся запроса не взяли их навстречу друг другу.
    let mut requested = req.seats.clone();
    requested.sort_unstable();

    let locked = sqlx::query_as::<_, Seat>(
        "SELECT id, auditorium_id, row_label, seat_number
         FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&requested)
    .fetch_all(&mut *tx)
    .await
    .map_err(map_storage_error)?;

    if locked.len() != requested.len() {
        let found: HashSet<i64> = locked.iter().map(|s| s.id).collect();
        let missing: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        return Err(ApiError::invalid_input(format!("unknown seats: {:?}", missing)));
    }

    if let Some(seat) = locked.iter().find(|s| s.auditorium_id != showtime.auditorium_id) {
        return Err(ApiError::invalid_input(format!(
            "seat {} does not belong to the showtime's auditorium",
            seat.id
        )));
    }

    // Повторная проверка конфликтов уже под блокировкой мест
    let conflicting = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT bs.seat_id
        FROM booking_seats bs
        JOIN bookings b ON b.id = bs.booking_id
        WHERE b.showtime_id = $1
          AND b.status = $2
          AND bs.seat_id = ANY($3)
        ORDER BY bs.seat_id
        "#,
    )
    .bind(req.showtime_id)
    .bind(STATUS_CONFIRMED)
    .bind(&requested)
    .fetch_all(&mut *tx)
    .await?;

    if !conflicting.is_empty() {
        return Err(ApiError::seat_conflict(conflicting));
    }

    let user_id = identity::resolve_user(
        &mut tx,
        claim,
        req.user_email.as_deref(),
        req.user_name.as_deref(),
    )
    .await?;

    let unit_price = seat_price(showtime.price, req.ticket_type);
    let total = round_cents(unit_price * requested.len() as f64);

    let booking_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bookings (user_id, showtime_id, status, total_amount)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(req.showtime_id)
    .bind(STATUS_CONFIRMED)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    for seat_id in &requested {
        sqlx::query(
            "INSERT INTO booking_seats (booking_id, seat_id, ticket_type, price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(booking_id)
        .bind(seat_id)
        .bind(req.ticket_type.as_str())
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(map_storage_error)?;

    tracing::info!(
        booking_id,
        showtime_id = req.showtime_id,
        seats = requested.len(),
        total,
        "booking confirmed"
    );

    Ok(BookingConfirmation { booking_id, total })
}

fn validate_request(req: &CreateBookingRequest) -> Result<(), ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    if req.showtime_id <= 0 {
        return Err(ApiError::invalid_input("showtimeId must be > 0"));
    }
    if req.seats.iter().any(|id| *id <= 0) {
        return Err(ApiError::invalid_input("seat ids must be > 0"));
    }

    let mut seen = HashSet::with_capacity(req.seats.len());
    if let Some(dup) = req.seats.iter().find(|id| !seen.insert(**id)) {
        return Err(ApiError::invalid_input(format!("duplicate seat id {}", dup)));
    }

    Ok(())
}

/// Цена одного места для данного типа билета, в центах без остатка.
pub fn seat_price(adult_price: f64, ticket_type: TicketType) -> f64 {
    match ticket_type {
        TicketType::Adult => round_cents(adult_price),
        TicketType::Child => round_cents(adult_price * CHILD_PRICE_MULTIPLIER),
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// Таймаут ожидания блокировки (55P03) — это Internal: запрос можно
// безопасно повторить, частичных записей не остаётся.
fn map_storage_error(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("55P03") {
            return ApiError::Internal(anyhow::anyhow!("lock wait timed out on seat rows"));
        }
    }
    e.into()
}
