// Subscription & billing: pricing, order creation with the payment provider,
// and webhook-driven activation.

pub mod handlers;
pub mod pricing;
pub mod razorpay;
pub mod webhook;

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::billing::pricing::{SubscriptionDetails, CURRENCY};
use crate::billing::razorpay::{OrderRequest, PaymentGateway};
use crate::errors::AppError;
use crate::models::user::User;

/// Everything the client needs to open the checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDescriptor {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub user_email: String,
    pub user_username: String,
}

/// `rcpt_<12 hex of user id>_<epoch secs>_<6 random hex>`; the random tail
/// keeps two orders in the same second apart. Stays under the provider's
/// 40 character limit.
pub fn receipt_id(user_id: Uuid, epoch_secs: i64) -> String {
    let user_hex = user_id.simple().to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    format!("rcpt_{}_{}_{}", &user_hex[..12], epoch_secs, &nonce[..6])
}

/// Prices the subscription from the user's current state and opens an
/// order for that amount with the provider.
pub async fn create_order(
    gateway: &dyn PaymentGateway,
    key_id: &str,
    user: &User,
) -> Result<OrderDescriptor, AppError> {
    let details = SubscriptionDetails::for_user(user);

    let mut notes = BTreeMap::new();
    notes.insert("user_id".to_string(), user.id.to_string());
    notes.insert("email".to_string(), user.email.clone());

    let request = OrderRequest {
        amount: details.final_price_paise,
        currency: CURRENCY.to_string(),
        receipt: receipt_id(user.id, Utc::now().timestamp()),
        notes,
    };
    let order = gateway.create_order(&request).await?;

    Ok(OrderDescriptor {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: key_id.to_string(),
        user_email: user.email.clone(),
        user_username: user.username.clone(),
    })
}
