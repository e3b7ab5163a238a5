use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Subscription state of a user. `Active` is terminal: nothing moves a user
/// back to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    None,
    Active,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Active => "active",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown subscription status '{0}'")]
pub struct UnknownSubscriptionStatus(String);

impl TryFrom<String> for SubscriptionStatus {
    type Error = UnknownSubscriptionStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "none" => Ok(SubscriptionStatus::None),
            "active" => Ok(SubscriptionStatus::Active),
            _ => Err(UnknownSubscriptionStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub subscription_status: SubscriptionStatus,
    pub xp: i64,
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
