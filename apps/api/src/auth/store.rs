//! User persistence.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{is_unique_violation, AppError};
use crate::models::user::{NewUser, SubscriptionStatus, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, subscription_status, xp, badges, created_at";

/// User records: identity, gamification counters and subscription state.
///
/// Carried in `AppState` as `Arc<dyn UserStore>`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// True when either the username or the email is already taken.
    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError>;

    /// Inserts a user. A uniqueness violation surfaces as `Conflict`.
    async fn insert(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Adds `xp_delta` and merges `badges` into the user's set, recording the
    /// change in the gamification audit log. `None` when the user is unknown.
    async fn apply_gamification(
        &self,
        user_id: Uuid,
        xp_delta: i64,
        badges: &[String],
    ) -> Result<Option<User>, AppError>;

    /// Sets the subscription to active. Returns false when the user is
    /// unknown. Applying it twice leaves the user active.
    async fn activate_subscription(&self, user_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, subscription_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(SubscriptionStatus::None.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                info!("Registered user {} ({})", user.id, user.username);
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_gamification(
        &self,
        user_id: Uuid,
        xp_delta: i64,
        badges: &[String],
    ) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET xp = xp + $2,
                badges = badges || ARRAY(
                    SELECT unnest($3::text[])
                    EXCEPT
                    SELECT unnest(users.badges)
                )
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(xp_delta)
        .bind(badges)
        .fetch_optional(&mut *tx)
        .await?;

        if user.is_some() {
            sqlx::query(
                "INSERT INTO gamification_events (user_id, xp_delta, badges) VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(xp_delta)
            .bind(badges)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn activate_subscription(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET subscription_status = $1 WHERE id = $2")
            .bind(SubscriptionStatus::Active.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
