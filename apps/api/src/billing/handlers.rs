//! Axum route handlers for subscription pricing, checkout and the payment
//! webhook.

use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::billing::pricing::{SubscriptionDetails, SubscriptionDetailsResponse};
use crate::billing::razorpay::SIGNATURE_HEADER;
use crate::billing::webhook::process_webhook;
use crate::billing::{self, OrderDescriptor};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /get_subscription_details
pub async fn handle_subscription_details(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<SubscriptionDetailsResponse> {
    Json(SubscriptionDetails::for_user(&user).into())
}

/// POST /create_order
pub async fn handle_create_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<OrderDescriptor>, AppError> {
    let order = billing::create_order(
        state.payments.as_ref(),
        &state.config.razorpay_key_id,
        &user,
    )
    .await?;
    Ok(Json(order))
}

/// POST /payment_webhook
///
/// Takes the raw body so the signature is checked over the exact bytes sent.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    process_webhook(
        state.users.as_ref(),
        state.config.razorpay_webhook_secret.as_deref(),
        &body,
        signature,
    )
    .await?;

    Ok(Json(json!({ "status": "ok" })))
}
