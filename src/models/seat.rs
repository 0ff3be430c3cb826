use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Место фиксировано в зале; внутри зала однозначно задаётся парой (row_label, seat_number)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub auditorium_id: i64,
    pub row_label: String,
    pub seat_number: i32,
}
