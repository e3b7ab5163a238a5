//! In-memory stand-ins for the storage, model and payment seams, so handler
//! and service tests run without Postgres or network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::store::UserStore;
use crate::billing::razorpay::{OrderRequest, PaymentGateway, ProviderOrder};
use crate::chat::sessions::summarize_sessions;
use crate::chat::store::ConversationStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{LlmError, Persona, ReplyGenerator};
use crate::models::conversation::{NewTurn, SessionSummary, Turn};
use crate::models::user::{NewUser, SubscriptionStatus, User};
use crate::state::AppState;

/// A user with the given XP and badges and no subscription.
pub fn user_with(xp: i64, badges: &[&str]) -> User {
    let id = Uuid::new_v4();
    User {
        id,
        username: format!("user-{}", &id.simple().to_string()[..8]),
        email: format!("{}@example.com", id.simple()),
        password_hash: "unused".to_string(),
        subscription_status: SubscriptionStatus::None,
        xp,
        badges: badges.iter().map(|b| b.to_string()).collect(),
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    events: Mutex<Vec<(Uuid, i64, Vec<String>)>>,
}

impl MemoryUserStore {
    pub fn seed_user(&self, username: &str, email: &str) -> User {
        let mut user = user_with(0, &[]);
        user.username = username.to_string();
        user.email = email.to_string();
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            subscription_status: SubscriptionStatus::None,
            xp: 0,
            badges: Vec::new(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn apply_gamification(
        &self,
        user_id: Uuid,
        xp_delta: i64,
        badges: &[String],
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.xp += xp_delta;
        for badge in badges {
            if !user.badges.contains(badge) {
                user.badges.push(badge.clone());
            }
        }
        self.events
            .lock()
            .unwrap()
            .push((user_id, xp_delta, badges.to_vec()));
        Ok(Some(user.clone()))
    }

    async fn activate_subscription(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.subscription_status = SubscriptionStatus::Active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryConversationStore {
    turns: Mutex<Vec<Turn>>,
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn insert_turn(&self, turn: NewTurn<'_>) -> Result<Turn, AppError> {
        let row = Turn {
            id: Uuid::new_v4(),
            user_id: turn.user_id,
            session_id: turn.session_id.to_string(),
            user_message: turn.user_message.to_string(),
            ei_response: turn.ei_response.to_string(),
            persona: turn.persona.to_string(),
            timestamp: Utc::now(),
        };
        self.turns.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionSummary>, AppError> {
        let turns = self.turns.lock().unwrap();
        Ok(summarize_sessions(
            turns.iter().filter(|t| t.user_id == user_id),
            limit as usize,
        ))
    }

    async fn history(
        &self,
        user_id: Uuid,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<Turn>, AppError> {
        let mut history: Vec<Turn> = self
            .turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.session_id == session_id)
            .cloned()
            .collect();
        history.sort_by_key(|t| t.timestamp);
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn update_user_message(
        &self,
        user_id: Uuid,
        turn_id: Uuid,
        new_text: &str,
    ) -> Result<Option<String>, AppError> {
        let mut turns = self.turns.lock().unwrap();
        Ok(turns
            .iter_mut()
            .find(|t| t.id == turn_id && t.user_id == user_id)
            .map(|t| {
                t.user_message = new_text.to_string();
                t.ei_response.clone()
            }))
    }

    async fn delete_session(&self, user_id: Uuid, session_id: &str) -> Result<u64, AppError> {
        let mut turns = self.turns.lock().unwrap();
        let before = turns.len();
        turns.retain(|t| !(t.user_id == user_id && t.session_id == session_id));
        Ok((before - turns.len()) as u64)
    }
}

/// A store whose writes always fail.
pub struct FailingConversationStore;

#[async_trait]
impl ConversationStore for FailingConversationStore {
    async fn insert_turn(&self, _turn: NewTurn<'_>) -> Result<Turn, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
    }

    async fn list_sessions(&self, _: Uuid, _: i64) -> Result<Vec<SessionSummary>, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
    }

    async fn history(&self, _: Uuid, _: &str, _: i64) -> Result<Vec<Turn>, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
    }

    async fn update_user_message(
        &self,
        _: Uuid,
        _: Uuid,
        _: &str,
    ) -> Result<Option<String>, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
    }

    async fn delete_session(&self, _: Uuid, _: &str) -> Result<u64, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
    }
}

/// Returns a fixed reply or a fixed failure, counting calls.
pub struct ScriptedGenerator {
    result: Result<String, LlmError>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            result: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate_reply(&self, _user_text: &str, _persona: Persona) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Accepts every order, echoing it back with id `order_<receipt>`.
#[derive(Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<OrderRequest>>,
}

impl RecordingGateway {
    pub fn requests(&self) -> Vec<OrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, AppError> {
        self.requests.lock().unwrap().push(order.clone());
        Ok(ProviderOrder {
            id: format!("order_{}", order.receipt),
            amount: order.amount,
            currency: order.currency.clone(),
        })
    }
}

/// App state over in-memory collaborators. The handles are returned so
/// tests can inspect what the handlers did.
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub llm: Arc<ScriptedGenerator>,
    pub payments: Arc<RecordingGateway>,
}

impl TestApp {
    pub fn new(generator: ScriptedGenerator) -> Self {
        Self::with_config(generator, Config::for_tests())
    }

    pub fn with_config(generator: ScriptedGenerator, config: Config) -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let llm = Arc::new(generator);
        let payments = Arc::new(RecordingGateway::default());
        let state = AppState {
            users: users.clone(),
            conversations: Arc::new(MemoryConversationStore::default()),
            llm: llm.clone(),
            payments: payments.clone(),
            config,
        };
        Self {
            state,
            users,
            llm,
            payments,
        }
    }
}
