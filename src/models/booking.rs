use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_CONFIRMED: &str = "confirmed";
// Terminal state reserved for a future cancellation flow; nothing writes it yet.
pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub showtime_id: i64,
    pub status: String,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingSeat {
    pub booking_id: i64,
    pub seat_id: i64,
    pub ticket_type: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    #[default]
    Adult,
    Child,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Adult => "adult",
            TicketType::Child => "child",
        }
    }
}
