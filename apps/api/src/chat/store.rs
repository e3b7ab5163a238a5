//! Conversation persistence.
//!
//! Every query is scoped by `user_id` in its WHERE clause. Ownership is never
//! checked after a fetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::chat::sessions::preview;
use crate::errors::AppError;
use crate::models::conversation::{NewTurn, SessionSummary, Turn};

/// Append-only log of chat turns keyed by (user, session).
///
/// Carried in `AppState` as `Arc<dyn ConversationStore>`.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Records a turn, assigning its id and timestamp.
    async fn insert_turn(&self, turn: NewTurn<'_>) -> Result<Turn, AppError>;

    /// Session summaries for a user, newest first.
    async fn list_sessions(&self, user_id: Uuid, limit: i64)
        -> Result<Vec<SessionSummary>, AppError>;

    /// Turns of one session in insertion order.
    async fn history(
        &self,
        user_id: Uuid,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<Turn>, AppError>;

    /// Rewrites the user message of a turn the user owns and returns the
    /// stored reply. `None` when no such turn belongs to the user.
    async fn update_user_message(
        &self,
        user_id: Uuid,
        turn_id: Uuid,
        new_text: &str,
    ) -> Result<Option<String>, AppError>;

    /// Removes every turn of a session. Returns the number removed.
    async fn delete_session(&self, user_id: Uuid, session_id: &str) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionStartRow {
    session_id: String,
    first_timestamp: DateTime<Utc>,
    first_user_message: String,
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn insert_turn(&self, turn: NewTurn<'_>) -> Result<Turn, AppError> {
        let row = sqlx::query_as::<_, Turn>(
            r#"
            INSERT INTO conversations
                (id, user_id, session_id, user_message, ei_response, persona)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, session_id, user_message, ei_response, persona, "timestamp"
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(turn.user_id)
        .bind(turn.session_id)
        .bind(turn.user_message)
        .bind(turn.ei_response)
        .bind(turn.persona)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Recorded turn {} in session {} for user {}",
            row.id, row.session_id, row.user_id
        );
        Ok(row)
    }

    async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionSummary>, AppError> {
        let rows = sqlx::query_as::<_, SessionStartRow>(
            r#"
            SELECT session_id, first_timestamp, first_user_message
            FROM (
                SELECT DISTINCT ON (session_id)
                       session_id,
                       "timestamp" AS first_timestamp,
                       user_message AS first_user_message
                FROM conversations
                WHERE user_id = $1
                ORDER BY session_id, "timestamp" ASC
            ) firsts
            ORDER BY first_timestamp DESC, session_id
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                first_user_message_preview: preview(&row.first_user_message),
                session_id: row.session_id,
                first_timestamp: row.first_timestamp,
            })
            .collect())
    }

    async fn history(
        &self,
        user_id: Uuid,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<Turn>, AppError> {
        Ok(sqlx::query_as::<_, Turn>(
            r#"
            SELECT id, user_id, session_id, user_message, ei_response, persona, "timestamp"
            FROM conversations
            WHERE user_id = $1 AND session_id = $2
            ORDER BY "timestamp" ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_user_message(
        &self,
        user_id: Uuid,
        turn_id: Uuid,
        new_text: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"
            UPDATE conversations
            SET user_message = $1
            WHERE id = $2 AND user_id = $3
            RETURNING ei_response
            "#,
        )
        .bind(new_text)
        .bind(turn_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, user_id: Uuid, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM conversations WHERE user_id = $1 AND session_id = $2")
            .bind(user_id)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
