//! Razorpay client: order creation and webhook signature checks.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};

use crate::errors::AppError;

const RAZORPAY_ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// Order as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Creates payment orders with the provider.
///
/// Carried in `AppState` as `Arc<dyn PaymentGateway>`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, AppError>;
}

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            key_id,
            key_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, AppError> {
        let response = self
            .client
            .post(RAZORPAY_ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(order)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("order request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Razorpay returned {}: {}", status, body);
            return Err(AppError::Payment(format!("order creation returned {status}")));
        }

        let created: ProviderOrder = response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("unreadable order response: {e}")))?;

        info!(
            "Created Razorpay order {} ({} {}) receipt {}",
            created.id, created.amount, created.currency, order.receipt
        );
        Ok(created)
    }
}

/// Checks a hex HMAC-SHA256 signature over the exact raw body.
/// The comparison runs in constant time.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 of `payload`, as the provider computes it.
#[cfg(test)]
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signature_verifies() {
        let body = br#"{"event":"payment.captured"}"#;
        let signature = sign_payload(body, "whsec");
        assert!(verify_webhook_signature(body, &signature, "whsec"));
    }

    #[test]
    fn test_tampered_body_or_wrong_secret_fails() {
        let body = br#"{"event":"payment.captured"}"#;
        let signature = sign_payload(body, "whsec");
        assert!(!verify_webhook_signature(
            br#"{"event":"payment.captured "}"#,
            &signature,
            "whsec"
        ));
        assert!(!verify_webhook_signature(body, &signature, "other"));
    }

    #[test]
    fn test_malformed_signature_fails() {
        let body = b"{}";
        assert!(!verify_webhook_signature(body, "not-hex", "whsec"));
        assert!(!verify_webhook_signature(body, "", "whsec"));
        assert!(!verify_webhook_signature(body, "abcd", "whsec"));
    }

    #[test]
    fn test_order_request_wire_shape() {
        let mut notes = BTreeMap::new();
        notes.insert("user_id".to_string(), "u1".to_string());
        let order = OrderRequest {
            amount: 49_900,
            currency: "INR".to_string(),
            receipt: "rcpt_1".to_string(),
            notes,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["amount"], 49_900);
        assert_eq!(json["notes"]["user_id"], "u1");
    }
}
