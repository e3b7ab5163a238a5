//! Session derivation: sessions are never stored, only grouped out of turns.

use std::collections::HashMap;

use crate::models::conversation::{SessionSummary, Turn};

/// Maximum number of sessions returned by a listing.
pub const SESSION_LIST_LIMIT: i64 = 50;
/// Maximum number of turns returned for one session's history.
pub const HISTORY_LIMIT: i64 = 100;
/// Characters of the first message kept in a session preview.
pub const PREVIEW_CHARS: usize = 30;

/// Truncates a first message to `PREVIEW_CHARS` characters plus `...`.
/// Messages at or under the limit come back unchanged.
pub fn preview(message: &str) -> String {
    match message.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

/// Groups turns by session and summarises each group by its earliest turn.
/// Newest session first, at most `limit` entries.
///
/// The Postgres store does the same grouping in SQL; this is the in-process
/// version of it.
pub fn summarize_sessions<'a, I>(turns: I, limit: usize) -> Vec<SessionSummary>
where
    I: IntoIterator<Item = &'a Turn>,
{
    let mut firsts: HashMap<&str, &Turn> = HashMap::new();
    for turn in turns {
        firsts
            .entry(turn.session_id.as_str())
            .and_modify(|first| {
                if turn.timestamp < first.timestamp {
                    *first = turn;
                }
            })
            .or_insert(turn);
    }

    let mut summaries: Vec<SessionSummary> = firsts
        .into_values()
        .map(|first| SessionSummary {
            session_id: first.session_id.clone(),
            first_timestamp: first.timestamp,
            first_user_message_preview: preview(&first.user_message),
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.first_timestamp
            .cmp(&a.first_timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    summaries.truncate(limit);
    summaries
}
