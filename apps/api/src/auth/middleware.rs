//! Session authentication: resolves the session cookie to a user.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::cookies::SESSION_COOKIE;
use crate::auth::token::verify_session_token;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Loads the user named by a valid session cookie, if any.
pub async fn session_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    let jar = CookieJar::from_headers(headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Some(claims) = verify_session_token(cookie.value(), state.config.secret_key.as_bytes())
    else {
        return Ok(None);
    };
    state.users.find_by_id(claims.sub).await
}

/// Axum middleware for API routes: rejects with 401 unless the session
/// cookie names an existing user, then injects `CurrentUser` into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = session_user(&state, request.headers())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
