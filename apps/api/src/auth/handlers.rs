//! Registration, login and logout handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::cookies::{clear_session_cookie, session_cookie};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::issue_session_token;
use crate::errors::AppError;
use crate::models::user::NewUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// `true`, `"on"` (an HTML checkbox) or absent.
    pub remember: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "on" | "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let (Some(username), Some(email), Some(password)) = (
        request.username.as_deref().map(str::trim).filter(|v| !v.is_empty()),
        request.email.as_deref().map(normalize_email).filter(|v| !v.is_empty()),
        request.password.as_deref().filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Username, email and password are required".to_string(),
        ));
    };

    if state.users.identity_taken(username, &email).await? {
        return Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;
    state
        .users
        .insert(NewUser {
            username: username.to_string(),
            email,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful. Please log in.".to_string(),
        }),
    ))
}

/// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (Some(email), Some(password)) = (
        request.email.as_deref().map(normalize_email),
        request.password.as_deref(),
    ) else {
        return Err(invalid());
    };

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash) {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let remember = is_truthy(request.remember.as_ref());
    let token = issue_session_token(
        user.id,
        &user.username,
        remember,
        state.config.secret_key.as_bytes(),
    )?;
    info!("User {} logged in (remember={remember})", user.id);

    Ok((
        jar.add(session_cookie(token, remember)),
        Json(MessageResponse {
            message: "Login successful".to_string(),
        }),
    ))
}

/// GET /logout
pub async fn handle_logout(jar: CookieJar) -> impl IntoResponse {
    (jar.add(clear_session_cookie()), Redirect::to("/auth"))
}
