//! Signed session tokens carried in the session cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Token lifetime for a "remember me" login.
pub const REMEMBERED_SESSION_DAYS: i64 = 30;
/// Token lifetime for a browser-session login.
pub const BROWSER_SESSION_DAYS: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues an HS256 session token for a user.
pub fn issue_session_token(
    user_id: Uuid,
    username: &str,
    remember: bool,
    secret: &[u8],
) -> Result<String, AppError> {
    let days = if remember {
        REMEMBERED_SESSION_DAYS
    } else {
        BROWSER_SESSION_DAYS
    };
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(days)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("session token encode: {e}")))
}

/// Verifies signature and expiry, returning the claims on success.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}
