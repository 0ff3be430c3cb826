use serde::Serialize;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::booking::STATUS_CONFIRMED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub id: i64,
    pub row_label: String,
    pub seat_number: i32,
    pub status: SeatStatus,
}

/// Статус каждого места зала для данного сеанса. Место занято, если на него
/// есть строка booking_seats подтверждённой брони этого сеанса.
///
/// Порядок фиксирован (ряд, затем номер), чтобы UI рисовал зал стабильно.
pub async fn seat_availability(
    pool: &PgPool,
    showtime_id: i64,
) -> Result<Vec<SeatAvailability>, ApiError> {
    let auditorium_id =
        sqlx::query_scalar::<_, i64>("SELECT auditorium_id FROM showtimes WHERE id = $1")
            .bind(showtime_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found("showtime not found"))?;

    let rows = sqlx::query_as::<_, (i64, String, i32, bool)>(
        r#"
        SELECT s.id, s.row_label, s.seat_number,
               EXISTS(
                 SELECT 1
                 FROM booking_seats bs
                 JOIN bookings b ON b.id = bs.booking_id
                 WHERE bs.seat_id = s.id
                   AND b.showtime_id = $1
                   AND b.status = $2
               ) AS booked
        FROM seats s
        WHERE s.auditorium_id = $3
        ORDER BY s.row_label, s.seat_number
        "#,
    )
    .bind(showtime_id)
    .bind(STATUS_CONFIRMED)
    .bind(auditorium_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, row_label, seat_number, booked)| SeatAvailability {
            id,
            row_label,
            seat_number,
            status: if booked { SeatStatus::Booked } else { SeatStatus::Available },
        })
        .collect())
}
