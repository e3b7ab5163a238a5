use std::fmt;

use anyhow::{Context, Result};

/// Hosted zephyr endpoint used when `HF_MODEL_API_URL` is not set.
pub const DEFAULT_MODEL_API_URL: &str =
    "https://api-inference.huggingface.co/models/HuggingFaceH4/zephyr-7b-beta";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub hf_api_key: String,
    pub hf_model_api_url: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    /// Optional: the webhook endpoint answers 500 while this is unset.
    pub razorpay_webhook_secret: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            secret_key: require_env("SECRET_KEY")?,
            hf_api_key: require_env("HF_API_KEY")?,
            hf_model_api_url: optional_env("HF_MODEL_API_URL")
                .unwrap_or_else(|| DEFAULT_MODEL_API_URL.to_string()),
            razorpay_key_id: require_env("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: require_env("RAZORPAY_KEY_SECRET")?,
            razorpay_webhook_secret: optional_env("RAZORPAY_WEBHOOK_SECRET"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hf_model_api_url", &self.hf_model_api_url)
            .field("razorpay_key_id", &self.razorpay_key_id)
            .field(
                "razorpay_webhook_secret",
                &self.razorpay_webhook_secret.as_ref().map(|_| "<set>"),
            )
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish_non_exhaustive()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for router-level tests.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/ei_test".to_string(),
            secret_key: "test-secret-key".to_string(),
            hf_api_key: "hf_test".to_string(),
            hf_model_api_url: DEFAULT_MODEL_API_URL.to_string(),
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: "rzp_test_secret".to_string(),
            razorpay_webhook_secret: Some("whsec_test".to_string()),
            port: 8080,
            rust_log: "debug".to_string(),
        }
    }
}
