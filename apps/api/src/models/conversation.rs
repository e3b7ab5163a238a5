use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user message and the reply generated for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Turn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: String,
    pub user_message: String,
    pub ei_response: String,
    pub persona: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields for a turn about to be recorded. The id and timestamp are
/// assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewTurn<'a> {
    pub user_id: Uuid,
    pub session_id: &'a str,
    pub user_message: &'a str,
    pub ei_response: &'a str,
    pub persona: &'a str,
}

/// Listing entry for one session: its first turn's time and a preview of
/// its first message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub first_timestamp: DateTime<Utc>,
    pub first_user_message_preview: String,
}
