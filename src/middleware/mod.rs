use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{config::JwtConfig, error::ApiError};

/// Verified identity claim. Produced only by [`verify_token`]; the rest of
/// the application treats the raw credential as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub email: String,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

pub fn issue_token(
    config: &JwtConfig,
    user_id: i64,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expires_at = Utc::now() + chrono::Duration::hours(config.expires_in_hours);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: expires_at.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Возвращает claim только если подпись и срок действия валидны.
/// Любая невалидность для вызывающего неотличима от отсутствия токена.
pub fn verify_token(config: &JwtConfig, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extractor для маршрутов, требующих аутентификации.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        let claims = verify_token(&state.config.jwt, token)
            .ok_or_else(|| ApiError::unauthorized("invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// Extractor для маршрутов, где аутентификация опциональна (гостевые
/// бронирования). Никогда не отклоняет запрос.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Claims>);

impl FromRequestParts<Arc<crate::AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts).and_then(|t| verify_token(&state.config.jwt, t));
        Ok(MaybeAuthUser(claims))
    }
}
