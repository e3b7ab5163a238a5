//! Browser pages. Protected pages redirect to `/auth` instead of answering 401.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::middleware::session_user;
use crate::errors::AppError;
use crate::state::AppState;

const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const AUTH_PAGE: &str = include_str!("../../templates/auth.html");
const SUBSCRIPTION_PAGE: &str = include_str!("../../templates/subscription.html");

async fn page_for_session(
    state: &AppState,
    headers: &HeaderMap,
    page: &'static str,
) -> Result<Response, AppError> {
    match session_user(state, headers).await? {
        Some(_) => Ok(Html(page).into_response()),
        None => Ok(Redirect::to("/auth").into_response()),
    }
}

/// GET /
pub async fn index_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    page_for_session(&state, &headers, INDEX_PAGE).await
}

/// GET /auth
pub async fn auth_page() -> Html<&'static str> {
    Html(AUTH_PAGE)
}

/// GET /subscription
pub async fn subscription_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    page_for_session(&state, &headers, SUBSCRIPTION_PAGE).await
}
