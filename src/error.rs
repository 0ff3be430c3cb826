use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Все ошибки API. Каждый вариант соответствует одному классу ответа,
/// чтобы клиент мог отличить "выберите другие места" от "исправьте запрос".
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete request (400).
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// Seat race lost or duplicate resource (409). `seats` lists the
    /// conflicting seat ids when known.
    #[error("{message}")]
    Conflict { message: String, seats: Vec<i64> },

    /// Missing or invalid credentials where required (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Storage or transport failure, including lock-wait timeout (500).
    /// The cause is logged, never sent to the client.
    #[error("internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict { message: msg.into(), seats: Vec::new() }
    }

    pub fn seat_conflict(seats: Vec<i64>) -> Self {
        let list = seats
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::Conflict {
            message: format!("seats already booked: {}", list),
            seats,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        Self::Internal(e.into())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicting_seats: Vec<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref cause) = self {
            tracing::error!("internal error: {:?}", cause);
        }

        let seats = match &self {
            Self::Conflict { seats, .. } => seats.clone(),
            _ => Vec::new(),
        };

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            conflicting_seats: seats,
        };

        (self.status(), Json(body)).into_response()
    }
}
