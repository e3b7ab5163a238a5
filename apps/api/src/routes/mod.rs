pub mod health;
pub mod pages;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::{self, middleware::require_auth};
use crate::billing;
use crate::chat;
use crate::gamification;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // JSON API behind the session cookie; failures answer 401.
    let protected = Router::new()
        .route(
            "/get_user_profile",
            get(gamification::handlers::handle_get_profile),
        )
        .route(
            "/update_gamification",
            post(gamification::handlers::handle_update_gamification),
        )
        .route("/chat", post(chat::handlers::handle_chat))
        .route("/get_sessions", get(chat::handlers::handle_get_sessions))
        .route("/get_history", get(chat::handlers::handle_get_history))
        .route(
            "/delete_session/:session_id",
            delete(chat::handlers::handle_delete_session),
        )
        .route(
            "/edit_message/:message_id",
            put(chat::handlers::handle_edit_message),
        )
        .route(
            "/get_subscription_details",
            get(billing::handlers::handle_subscription_details),
        )
        .route(
            "/create_order",
            post(billing::handlers::handle_create_order),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        // Pages
        .route("/", get(pages::index_page))
        .route("/auth", get(pages::auth_page))
        .route("/subscription", get(pages::subscription_page))
        // Identity
        .route("/register", post(auth::handlers::handle_register))
        .route("/login", post(auth::handlers::handle_login))
        .route("/logout", get(auth::handlers::handle_logout))
        // Payment provider callback, authenticated by signature
        .route(
            "/payment_webhook",
            post(billing::handlers::handle_payment_webhook),
        )
        .merge(protected)
        .with_state(state)
}
