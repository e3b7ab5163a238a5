//! Identity: registration, login and the per-request session user.

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod store;
pub mod token;

use crate::models::user::User;

/// The authenticated user, attached to request extensions by
/// `middleware::require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);
