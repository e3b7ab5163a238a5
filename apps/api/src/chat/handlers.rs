//! Axum route handlers for chat and conversation history.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::chat::service;
use crate::errors::AppError;
use crate::llm_client::Persona;
use crate::models::conversation::{SessionSummary, Turn};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub persona: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub user_message_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub new_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageResponse {
    pub message: String,
    pub original_ei_response: String,
}

/// Returns a required text field as sent, or a 400 when it is missing or
/// blank. Surrounding whitespace is kept: messages may be indented code.
fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// POST /chat
///
/// Always answers 200 with a reply once the request is valid; model failures
/// arrive as fallback text.
pub async fn handle_chat(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = required(&request.message, "message")?;
    let session_id = required(&request.session_id, "session_id")?;
    let persona = Persona::from_tag(request.persona.as_deref().unwrap_or_default());

    let outcome = service::send_message(
        state.llm.as_ref(),
        state.conversations.as_ref(),
        user.id,
        session_id,
        message,
        persona,
    )
    .await;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        user_message_id: outcome.turn_id,
    }))
}

/// GET /get_sessions
pub async fn handle_get_sessions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let sessions = service::list_sessions(state.conversations.as_ref(), user.id).await?;
    Ok(Json(sessions))
}

/// GET /get_history?session_id=
pub async fn handle_get_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Turn>>, AppError> {
    let session_id = required(&params.session_id, "session_id")?;
    let history = service::get_history(state.conversations.as_ref(), user.id, session_id).await?;
    Ok(Json(history))
}

/// DELETE /delete_session/:session_id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, AppError> {
    let deleted_count =
        service::delete_session(state.conversations.as_ref(), user.id, &session_id).await?;
    Ok(Json(DeleteSessionResponse {
        message: "Session deleted".to_string(),
        deleted_count,
    }))
}

/// PUT /edit_message/:message_id
pub async fn handle_edit_message(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(message_id): Path<String>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<EditMessageResponse>, AppError> {
    let new_message = required(&request.new_message, "new_message")?;
    // A malformed id cannot name any turn.
    let turn_id = Uuid::parse_str(&message_id)
        .map_err(|_| AppError::NotFound(format!("Message {message_id} not found")))?;

    let original_ei_response =
        service::edit_turn(state.conversations.as_ref(), user.id, turn_id, new_message).await?;

    Ok(Json(EditMessageResponse {
        message: "Message updated".to_string(),
        original_ei_response,
    }))
}
