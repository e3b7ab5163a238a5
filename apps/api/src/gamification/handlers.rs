use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::gamification::{level_for_xp, validate_update};
use crate::models::user::{SubscriptionStatus, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub xp: i64,
    pub level: usize,
    pub badges: Vec<String>,
    pub subscription_status: SubscriptionStatus,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        ProfileResponse {
            level: level_for_xp(user.xp),
            username: user.username,
            xp: user.xp,
            badges: user.badges,
            subscription_status: user.subscription_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GamificationUpdate {
    pub xp: Option<i64>,
    pub badges: Option<Vec<String>>,
}

/// GET /get_user_profile
pub async fn handle_get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ProfileResponse> {
    Json(user.into())
}

/// POST /update_gamification
///
/// Applies the valid part of the update; 400 when nothing in it is valid.
pub async fn handle_update_gamification(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<GamificationUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let update = validate_update(request.xp, request.badges.as_deref());
    if update.is_empty() {
        return Err(AppError::Validation(
            "No valid XP or badge data provided".to_string(),
        ));
    }

    let updated = state
        .users
        .apply_gamification(user.id, update.xp_delta, &update.badges)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    info!(
        "Gamification update for user {}: +{} xp, badges {:?}",
        user.id, update.xp_delta, update.badges
    );
    Ok(Json(updated.into()))
}
