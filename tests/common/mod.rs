use filmpass::models::booking::TicketType;
use filmpass::services::booking::CreateBookingRequest;
use sqlx::PgPool;

/// Первый сеанс из каталога: (id, auditorium_id, adult price).
pub async fn first_showtime(pool: &PgPool) -> (i64, i64, f64) {
    sqlx::query_as("SELECT id, auditorium_id, price FROM showtimes ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .expect("seeded showtime")
}

/// Первые `n` мест зала в порядке (ряд, номер).
pub async fn seats_in_auditorium(pool: &PgPool, auditorium_id: i64, n: i64) -> Vec<i64> {
    sqlx::query_scalar(
        "SELECT id FROM seats WHERE auditorium_id = $1 ORDER BY row_label, seat_number LIMIT $2",
    )
    .bind(auditorium_id)
    .bind(n)
    .fetch_all(pool)
    .await
    .expect("seeded seats")
}

pub fn guest_request(showtime_id: i64, seats: Vec<i64>, email: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        showtime_id,
        seats,
        ticket_type: TicketType::Adult,
        user_email: Some(email.to_string()),
        user_name: None,
    }
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count")
}
