use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Marker stored in the password column for guest accounts. The column is
/// NOT NULL, and the marker is never a valid bcrypt hash, so a guest cannot
/// log in until an explicit registration overwrites it.
pub const GUEST_PASSWORD: &str = "guest";

pub const ROLE_CUSTOMER: &str = "customer";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    // Найти пользователя по email
    pub async fn find_by_email(
        email: &str,
        pool: &sqlx::PgPool,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    // Проверить пароль (bcrypt; guest marker никогда не проходит)
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password).unwrap_or(false)
    }

    pub fn is_guest(&self) -> bool {
        self.password == GUEST_PASSWORD
    }
}
