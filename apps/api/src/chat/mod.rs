// Conversation store: chat turns grouped into client-named sessions.
// All model calls go through llm_client; all storage through ConversationStore.

pub mod handlers;
pub mod service;
pub mod sessions;
pub mod store;
