//! Payment webhook reconciliation.
//!
//! The signature is checked over the raw bytes before the body is parsed.
//! Only payment-completed events change state, and the only transition is
//! `none -> active` for the user named in the order notes.

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::store::UserStore;
use crate::billing::razorpay::verify_webhook_signature;
use crate::errors::AppError;

/// Events that mean the subscription has been paid for.
const PAYMENT_COMPLETED_EVENTS: [&str; 2] = ["payment.captured", "order.paid"];

/// Where the paying user's id is found, in order of preference.
const USER_ID_POINTERS: [&str; 2] = [
    "/payload/payment/entity/notes/user_id",
    "/payload/order/entity/notes/user_id",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The user's subscription is now active.
    Activated(Uuid),
    /// Payment completed but the notes name no known user.
    UnknownUser(Option<String>),
    /// Any event that is not a payment completion.
    Ignored(String),
}

/// Verifies, parses and applies one webhook delivery.
pub async fn process_webhook(
    users: &dyn UserStore,
    secret: Option<&str>,
    raw_body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookOutcome, AppError> {
    let secret = secret.ok_or_else(|| {
        AppError::Misconfigured("RAZORPAY_WEBHOOK_SECRET is not set".to_string())
    })?;

    let verified = signature
        .map(|sig| verify_webhook_signature(raw_body, sig, secret))
        .unwrap_or(false);
    if !verified {
        warn!(
            signature_present = signature.is_some(),
            "SECURITY: rejected payment webhook with invalid signature"
        );
        return Err(AppError::InvalidSignature);
    }

    let event: Value = serde_json::from_slice(raw_body)
        .map_err(|_| AppError::Validation("Webhook body is not valid JSON".to_string()))?;
    let event_type = event
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if !PAYMENT_COMPLETED_EVENTS.contains(&event_type) {
        info!("Ignoring payment webhook event '{event_type}'");
        return Ok(WebhookOutcome::Ignored(event_type.to_string()));
    }

    let raw_user_id = USER_ID_POINTERS
        .iter()
        .find_map(|pointer| event.pointer(pointer).and_then(Value::as_str));

    let Some(user_id) = raw_user_id.and_then(|id| Uuid::parse_str(id).ok()) else {
        warn!("Payment webhook '{event_type}' carries no usable user id: {raw_user_id:?}");
        return Ok(WebhookOutcome::UnknownUser(raw_user_id.map(str::to_string)));
    };

    if users.activate_subscription(user_id).await? {
        info!("Subscription activated for user {user_id} via '{event_type}'");
        Ok(WebhookOutcome::Activated(user_id))
    } else {
        warn!("Payment webhook '{event_type}' names unknown user {user_id}");
        Ok(WebhookOutcome::UnknownUser(Some(user_id.to_string())))
    }
}
