//! End-to-end tests for the booking transaction engine, run against a real
//! Postgres instance provisioned per test by `#[sqlx::test]`.

mod common;

use filmpass::error::ApiError;
use filmpass::middleware::Claims;
use filmpass::models::booking::{Booking, BookingSeat, TicketType};
use filmpass::services::availability::{seat_availability, SeatStatus};
use filmpass::services::booking::{create_booking, seat_price};
use sqlx::PgPool;

#[sqlx::test(migrations = "./src/migrations")]
async fn guest_booking_creates_user_and_line_items(pool: PgPool) {
    let (showtime, auditorium, price) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 2).await;

    let req = common::guest_request(showtime, seats.clone(), "x@y.com");
    let confirmation = create_booking(&pool, &req, None).await.expect("booking");

    let expected = seat_price(price, TicketType::Adult) * 2.0;
    assert!((confirmation.total - expected).abs() < 1e-9);

    // ровно один новый пользователь
    let users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'x@y.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(users, 1);

    let booking: Booking = sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
        .bind(confirmation.booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.showtime_id, showtime);
    assert!((booking.total_amount - confirmation.total).abs() < 1e-9);

    let line_items: Vec<BookingSeat> = sqlx::query_as(
        "SELECT booking_id, seat_id, ticket_type, price
         FROM booking_seats WHERE booking_id = $1 ORDER BY seat_id",
    )
    .bind(confirmation.booking_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(line_items.len(), 2);
    let unit = seat_price(price, TicketType::Adult);
    for item in &line_items {
        assert_eq!(item.ticket_type, "adult");
        assert!((item.price - unit).abs() < 1e-9);
        assert!(seats.contains(&item.seat_id));
    }
}

#[sqlx::test(migrations = "./src/migrations")]
async fn booking_total_equals_sum_of_line_prices(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 3).await;

    let mut req = common::guest_request(showtime, seats, "sum@example.com");
    req.ticket_type = TicketType::Child;
    let confirmation = create_booking(&pool, &req, None).await.expect("booking");

    let sum: f64 = sqlx::query_scalar(
        "SELECT SUM(price) FROM booking_seats WHERE booking_id = $1",
    )
    .bind(confirmation.booking_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!((sum - confirmation.total).abs() < 1e-9);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn booked_seats_belong_to_showtime_auditorium(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 2).await;

    let req = common::guest_request(showtime, seats, "aud@example.com");
    let confirmation = create_booking(&pool, &req, None).await.expect("booking");

    let mismatched: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM booking_seats bs
        JOIN bookings b ON b.id = bs.booking_id
        JOIN showtimes st ON st.id = b.showtime_id
        JOIN seats s ON s.id = bs.seat_id
        WHERE bs.booking_id = $1 AND s.auditorium_id <> st.auditorium_id
        "#,
    )
    .bind(confirmation.booking_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(mismatched, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn repeated_guest_email_reuses_user(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 4).await;

    let first = common::guest_request(showtime, seats[..2].to_vec(), "same@example.com");
    let second = common::guest_request(showtime, seats[2..].to_vec(), "same@example.com");
    let a = create_booking(&pool, &first, None).await.expect("first booking");
    let b = create_booking(&pool, &second, None).await.expect("second booking");

    let users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'same@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(users, 1);

    let owners: Vec<i64> =
        sqlx::query_scalar("SELECT user_id FROM bookings WHERE id = $1 OR id = $2")
            .bind(a.booking_id)
            .bind(b.booking_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(owners[0], owners[1]);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn verified_claim_short_circuits_lookup(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 1).await;

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role)
         VALUES ('Registered', 'reg@example.com', '$2b$12$abcdefghijklmnopqrstuv', 'customer')
         RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let claim = Claims {
        sub: user_id,
        email: "reg@example.com".to_string(),
        exp: i64::MAX,
    };

    // email в запросе отсутствует: личность должна прийти из claim
    let mut req = common::guest_request(showtime, seats, "unused@example.com");
    req.user_email = None;
    let confirmation = create_booking(&pool, &req, Some(&claim)).await.expect("booking");

    let owner: i64 = sqlx::query_scalar("SELECT user_id FROM bookings WHERE id = $1")
        .bind(confirmation.booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(owner, user_id);
    assert_eq!(common::count(&pool, "users").await, 1);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn child_tickets_cost_seventy_percent(pool: PgPool) {
    let (showtime, auditorium, price) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 2).await;

    let mut req = common::guest_request(showtime, seats, "kids@example.com");
    req.ticket_type = TicketType::Child;
    let confirmation = create_booking(&pool, &req, None).await.expect("booking");

    let expected = seat_price(price, TicketType::Child) * 2.0;
    assert!((confirmation.total - expected).abs() < 1e-9);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn sequential_conflict_reports_overlap_and_writes_nothing(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 3).await;

    let first = common::guest_request(showtime, vec![seats[0], seats[1]], "one@example.com");
    create_booking(&pool, &first, None).await.expect("first booking");

    // второй запрос пересекается по seats[1]
    let second = common::guest_request(showtime, vec![seats[1], seats[2]], "two@example.com");
    let err = create_booking(&pool, &second, None).await.unwrap_err();
    match err {
        ApiError::Conflict { seats: conflicting, .. } => {
            assert_eq!(conflicting, vec![seats[1]]);
        }
        other => panic!("expected Conflict, got {:?}", other),
    }

    // проигравший не оставил ни брони, ни гостевого пользователя
    assert_eq!(common::count(&pool, "bookings").await, 1);
    assert_eq!(common::count(&pool, "booking_seats").await, 2);
    let losers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'two@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(losers, 0);

    // seats[2] осталось свободным
    let availability = seat_availability(&pool, showtime).await.unwrap();
    let free = availability.iter().find(|s| s.id == seats[2]).unwrap();
    assert_eq!(free.status, SeatStatus::Available);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn concurrent_overlapping_bookings_yield_one_winner(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 3).await;

    let req_a = common::guest_request(showtime, vec![seats[0], seats[1]], "a@example.com");
    let req_b = common::guest_request(showtime, vec![seats[1], seats[2]], "b@example.com");

    let (res_a, res_b) = tokio::join!(
        create_booking(&pool, &req_a, None),
        create_booking(&pool, &req_b, None),
    );

    let winners = [res_a.is_ok(), res_b.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(winners, 1, "exactly one overlapping booking may succeed");

    let loser = if res_a.is_ok() { res_b } else { res_a };
    match loser {
        Err(ApiError::Conflict { seats: conflicting, .. }) => {
            assert!(conflicting.contains(&seats[1]));
        }
        other => panic!("expected Conflict, got {:?}", other),
    }

    // ровно одна бронь, ровно две строки мест
    assert_eq!(common::count(&pool, "bookings").await, 1);
    assert_eq!(common::count(&pool, "booking_seats").await, 2);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn invalid_payloads_write_nothing(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let seats = common::seats_in_auditorium(&pool, auditorium, 2).await;

    // пустой список мест
    let empty = common::guest_request(showtime, vec![], "e1@example.com");
    assert!(matches!(
        create_booking(&pool, &empty, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));

    // дубликат места
    let dup = common::guest_request(showtime, vec![seats[0], seats[0]], "e2@example.com");
    assert!(matches!(
        create_booking(&pool, &dup, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));

    // несуществующий сеанс
    let missing = common::guest_request(999_999, seats.clone(), "e3@example.com");
    assert!(matches!(
        create_booking(&pool, &missing, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));

    // ни claim, ни email
    let mut anon = common::guest_request(showtime, seats.clone(), "e4@example.com");
    anon.user_email = None;
    assert!(matches!(
        create_booking(&pool, &anon, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));

    // несуществующее место
    let ghost = common::guest_request(showtime, vec![seats[0], 999_999], "e5@example.com");
    assert!(matches!(
        create_booking(&pool, &ghost, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));

    assert_eq!(common::count(&pool, "bookings").await, 0);
    assert_eq!(common::count(&pool, "booking_seats").await, 0);
    assert_eq!(common::count(&pool, "users").await, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn seat_from_other_auditorium_is_rejected(pool: PgPool) {
    let (showtime, auditorium, _) = common::first_showtime(&pool).await;
    let own = common::seats_in_auditorium(&pool, auditorium, 1).await;

    let foreign: i64 = sqlx::query_scalar(
        "SELECT id FROM seats WHERE auditorium_id <> $1 ORDER BY id LIMIT 1",
    )
    .bind(auditorium)
    .fetch_one(&pool)
    .await
    .unwrap();

    let req = common::guest_request(showtime, vec![own[0], foreign], "mix@example.com");
    assert!(matches!(
        create_booking(&pool, &req, None).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));
    assert_eq!(common::count(&pool, "bookings").await, 0);
}
