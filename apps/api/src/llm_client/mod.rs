//! LLM Client: the single point of entry for hosted-model calls.
//!
//! No other module may call the inference API directly; chat handlers go
//! through the `ReplyGenerator` trait, which `LlmClient` implements.
//!
//! One attempt per user message. Failures come back as a categorised
//! `LlmError`, and `LlmError::fallback_reply` turns each category into the
//! fixed in-character text the chat UI shows instead of an error.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub use prompts::Persona;

const MAX_NEW_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.75;
const TOP_P: f32 = 0.9;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("model overloaded or loading")]
    Overloaded,

    #[error("provider rejected the API credentials")]
    InvalidCredentials,

    #[error("model endpoint not found")]
    ModelNotFound,

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("unexpected response shape")]
    UnexpectedResponse,
}

impl LlmError {
    /// The reply shown to the user in place of a generated one.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            LlmError::Timeout => {
                "The echoes are taking too long to return (timeout). Please try again shortly."
            }
            LlmError::RateLimited => {
                "The digital winds are too strong at the moment (rate limit reached). Please try again shortly."
            }
            LlmError::Overloaded => {
                "I am currently processing many thoughts (model is busy or loading). Please try again in a moment."
            }
            LlmError::InvalidCredentials => {
                "My connection credentials seem to be incorrect. Please check the API key."
            }
            LlmError::ModelNotFound => {
                "The specific AI model endpoint was not found. Please check the model URL."
            }
            LlmError::Connection(_) => {
                "My connection to the digital ether seems to be unstable. Please try again."
            }
            LlmError::UnexpectedResponse => {
                "I received an unusual echo from the void (unexpected response structure). Could you try again?"
            }
        }
    }
}

/// Collapses a generation result into the text returned to the client.
pub fn reply_or_fallback(result: Result<String, LlmError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!(category = %e, "LLM call failed; returning fallback reply");
            e.fallback_reply().to_string()
        }
    }
}

/// Produces a reply for a user message in a persona's voice.
///
/// Carried in `AppState` as `Arc<dyn ReplyGenerator>`.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(&self, user_text: &str, persona: Persona) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    wait_for_model: bool,
}

/// Client for the hosted text-generation inference API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url,
            api_key,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ReplyGenerator for LlmClient {
    async fn generate_reply(&self, user_text: &str, persona: Persona) -> Result<String, LlmError> {
        let prompt = prompts::build_chat_prompt(persona, user_text);
        let request_body = GenerationRequest {
            inputs: &prompt,
            parameters: GenerationParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: TEMPERATURE,
                top_p: TOP_P,
                do_sample: true,
                return_full_text: false,
            },
            options: GenerationOptions {
                wait_for_model: true,
            },
        };

        debug!(persona = persona.as_str(), "Calling inference API");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Inference API returned {}: {}", status, body);
            return Err(classify_failure(status.as_u16(), &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| LlmError::UnexpectedResponse)?;

        extract_generated_text(&body)
    }
}

fn classify_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Connection(err.to_string())
    }
}

/// Maps a non-2xx provider response to a failure category. The provider's
/// error text wins over the bare status code.
fn classify_failure(status: u16, body: &str) -> LlmError {
    if body.contains("Rate limit reached") {
        LlmError::RateLimited
    } else if body.contains("Model is overloaded")
        || body.contains("currently loading")
        || body.contains("estimated_time")
    {
        LlmError::Overloaded
    } else if body.contains("Authorization header is invalid") {
        LlmError::InvalidCredentials
    } else {
        match status {
            429 => LlmError::RateLimited,
            503 => LlmError::Overloaded,
            401 | 403 => LlmError::InvalidCredentials,
            404 => LlmError::ModelNotFound,
            _ => LlmError::Connection(format!("status {status}")),
        }
    }
}

/// Pulls the generated text out of `[{"generated_text": "..."}]`.
fn extract_generated_text(body: &Value) -> Result<String, LlmError> {
    body.as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or(LlmError::UnexpectedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_generated_text_trims() {
        let body = json!([{ "generated_text": "  Hello, wanderer.\n" }]);
        assert_eq!(extract_generated_text(&body).unwrap(), "Hello, wanderer.");
    }

    #[test]
    fn test_extract_generated_text_rejects_other_shapes() {
        for body in [
            json!({ "generated_text": "not a list" }),
            json!([]),
            json!([{ "text": "wrong key" }]),
            json!([{ "generated_text": 42 }]),
        ] {
            assert_eq!(
                extract_generated_text(&body),
                Err(LlmError::UnexpectedResponse),
                "body {body}"
            );
        }
    }

    #[test]
    fn test_classify_failure_prefers_body_text() {
        assert_eq!(
            classify_failure(400, "Rate limit reached. Please log in."),
            LlmError::RateLimited
        );
        assert_eq!(
            classify_failure(500, r#"{"error":"Model is currently loading","estimated_time":20.0}"#),
            LlmError::Overloaded
        );
        assert_eq!(
            classify_failure(400, "Authorization header is invalid"),
            LlmError::InvalidCredentials
        );
    }

    #[test]
    fn test_classify_failure_by_status() {
        assert_eq!(classify_failure(429, ""), LlmError::RateLimited);
        assert_eq!(classify_failure(503, ""), LlmError::Overloaded);
        assert_eq!(classify_failure(401, ""), LlmError::InvalidCredentials);
        assert_eq!(classify_failure(404, "Not Found"), LlmError::ModelNotFound);
        assert!(matches!(
            classify_failure(502, "bad gateway"),
            LlmError::Connection(_)
        ));
    }

    #[test]
    fn test_reply_or_fallback() {
        assert_eq!(reply_or_fallback(Ok("hi".to_string())), "hi");
        assert_eq!(
            reply_or_fallback(Err(LlmError::Timeout)),
            LlmError::Timeout.fallback_reply()
        );
    }

    #[test]
    fn test_fallback_replies_are_distinct() {
        let errors = [
            LlmError::Timeout,
            LlmError::RateLimited,
            LlmError::Overloaded,
            LlmError::InvalidCredentials,
            LlmError::ModelNotFound,
            LlmError::Connection("reset".into()),
            LlmError::UnexpectedResponse,
        ];
        let mut replies: Vec<_> = errors.iter().map(LlmError::fallback_reply).collect();
        replies.sort_unstable();
        replies.dedup();
        assert_eq!(replies.len(), errors.len());
    }
}
