use std::sync::Arc;

use crate::auth::store::UserStore;
use crate::billing::razorpay::PaymentGateway;
use crate::chat::store::ConversationStore;
use crate::config::Config;
use crate::llm_client::ReplyGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator is built once in `main` and shared behind an `Arc`;
/// tests swap in in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub llm: Arc<dyn ReplyGenerator>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Config,
}
