use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{self, AuthUser};
use crate::models::user::{User, ROLE_CUSTOMER};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;

    let user = match User::find_by_email(&req.email, &state.db.pool).await? {
        // Гостевой аккаунт с этим email превращаем в полноценный
        Some(existing) if existing.is_guest() => {
            sqlx::query_as::<_, User>(
                "UPDATE users SET name = $1, password = $2 WHERE id = $3 RETURNING *",
            )
            .bind(&req.name)
            .bind(&password_hash)
            .bind(existing.id)
            .fetch_one(&state.db.pool)
            .await?
        }
        Some(_) => {
            return Err(ApiError::conflict("email already registered"));
        }
        None => {
            sqlx::query_as::<_, User>(
                "INSERT INTO users (name, email, password, role)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *",
            )
            .bind(&req.name)
            .bind(&req.email)
            .bind(&password_hash)
            .bind(ROLE_CUSTOMER)
            .fetch_one(&state.db.pool)
            .await?
        }
    };

    let token = middleware::issue_token(&state.config.jwt, user.id, &user.email)
        .map_err(|e| ApiError::Internal(e.into()))?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::find_by_email(&req.email, &state.db.pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;

    // Гостевой маркер не является bcrypt-хешем и никогда не проходит
    if !user.verify_password(&req.password) {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    let token = middleware::issue_token(&state.config.jwt, user.id, &user.email)
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(AuthResponse { token, user }))
}

// GET /api/auth/me
async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("user no longer exists"))?;

    Ok(Json(user))
}
