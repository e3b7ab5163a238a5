//! Conversation operations shared by the chat handlers.

use tracing::{error, info};
use uuid::Uuid;

use crate::chat::sessions::{HISTORY_LIMIT, SESSION_LIST_LIMIT};
use crate::chat::store::ConversationStore;
use crate::errors::AppError;
use crate::llm_client::{reply_or_fallback, Persona, ReplyGenerator};
use crate::models::conversation::{NewTurn, SessionSummary, Turn};

/// Reply to a chat message and the id of the recorded turn, if it was stored.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub turn_id: Option<Uuid>,
}

/// Generates a reply, then records the turn.
///
/// The model call and the write are not coupled: if the write fails the
/// reply is still returned, with no turn id.
pub async fn send_message(
    generator: &dyn ReplyGenerator,
    store: &dyn ConversationStore,
    user_id: Uuid,
    session_id: &str,
    message: &str,
    persona: Persona,
) -> ChatOutcome {
    let reply = reply_or_fallback(generator.generate_reply(message, persona).await);

    let new_turn = NewTurn {
        user_id,
        session_id,
        user_message: message,
        ei_response: &reply,
        persona: persona.as_str(),
    };

    let turn_id = match store.insert_turn(new_turn).await {
        Ok(turn) => Some(turn.id),
        Err(e) => {
            error!("Failed to record turn for user {user_id} in session {session_id}: {e}");
            None
        }
    };

    ChatOutcome { reply, turn_id }
}

pub async fn list_sessions(
    store: &dyn ConversationStore,
    user_id: Uuid,
) -> Result<Vec<SessionSummary>, AppError> {
    store.list_sessions(user_id, SESSION_LIST_LIMIT).await
}

/// Turns of one of the caller's sessions, oldest first. A session with no
/// turns for this user, including another user's session, is NotFound.
pub async fn get_history(
    store: &dyn ConversationStore,
    user_id: Uuid,
    session_id: &str,
) -> Result<Vec<Turn>, AppError> {
    let history = store.history(user_id, session_id, HISTORY_LIMIT).await?;
    if history.is_empty() {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    Ok(history)
}

/// Rewrites the user message of a turn and returns its original reply.
/// The reply is not regenerated and stays as it was before the edit.
pub async fn edit_turn(
    store: &dyn ConversationStore,
    user_id: Uuid,
    turn_id: Uuid,
    new_text: &str,
) -> Result<String, AppError> {
    let reply = store
        .update_user_message(user_id, turn_id, new_text)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {turn_id} not found")))?;
    info!("User {user_id} edited turn {turn_id}");
    Ok(reply)
}

pub async fn delete_session(
    store: &dyn ConversationStore,
    user_id: Uuid,
    session_id: &str,
) -> Result<u64, AppError> {
    let deleted = store.delete_session(user_id, session_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    info!("User {user_id} deleted session {session_id} ({deleted} turns)");
    Ok(deleted)
}
