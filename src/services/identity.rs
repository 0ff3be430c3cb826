use sqlx::PgConnection;

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::models::user::{GUEST_PASSWORD, ROLE_CUSTOMER};

/// Разрешает личность для новой брони: verified claim → id как есть,
/// иначе ищем по email, иначе создаём гостевой аккаунт.
///
/// Выполняется на соединении транзакции бронирования: если бронь не
/// состоялась, гостевой пользователь тоже откатывается.
pub async fn resolve_user(
    conn: &mut PgConnection,
    claim: Option<&Claims>,
    guest_email: Option<&str>,
    guest_name: Option<&str>,
) -> Result<i64, ApiError> {
    if let Some(claim) = claim {
        // Claim уже проверен коллаборатором аутентификации
        return Ok(claim.sub);
    }

    let email = guest_email.ok_or_else(|| {
        ApiError::invalid_input("a booking needs either an authenticated user or a guest email")
    })?;

    // Точное совпадение по email
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let name = guest_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_guest_name(email));

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(&name)
    .bind(email)
    .bind(GUEST_PASSWORD)
    .bind(ROLE_CUSTOMER)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(user_id = id, "guest user created");
    Ok(id)
}

// Имя по умолчанию — локальная часть адреса до '@'
fn default_guest_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
