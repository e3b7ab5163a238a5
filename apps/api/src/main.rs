mod auth;
mod billing;
mod chat;
mod config;
mod db;
mod errors;
mod gamification;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::store::PgUserStore;
use crate::billing::razorpay::RazorpayClient;
use crate::chat::store::PgConversationStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ei API v{}", env!("CARGO_PKG_VERSION"));

    if config.razorpay_webhook_secret.is_none() {
        warn!("RAZORPAY_WEBHOOK_SECRET is not set; /payment_webhook will answer 500");
    }

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.hf_model_api_url.clone(), config.hf_api_key.clone())?;
    info!("LLM client initialized (endpoint: {})", llm.api_url());

    // Initialize payment provider client
    let payments = RazorpayClient::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    )?;
    info!("Razorpay client initialized");

    // Build app state
    let state = AppState {
        users: Arc::new(PgUserStore::new(db.clone())),
        conversations: Arc::new(PgConversationStore::new(db)),
        llm: Arc::new(llm),
        payments: Arc::new(payments),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
