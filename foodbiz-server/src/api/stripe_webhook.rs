//! Stripe webhook handler
//!
//! POST /api/public/stripe/webhook (raw body for signature verification)

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use http::HeaderMap;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};

use crate::api::{ApiResult, internal};
use crate::services::reconciler;
use crate::state::AppState;
use crate::stripe;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Handle incoming Stripe webhook events
///
/// Must receive the raw body (not JSON) for HMAC signature verification.
/// Every verified event is acknowledged unless the database fails, so
/// Stripe only retries deliveries that did not land.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Value> {
    let secret = state
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotConfigured))?;

    let sig_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Stripe-Signature header");
            AppError::new(ErrorCode::WebhookSignatureInvalid)
        })?;

    let now = chrono::Utc::now().timestamp();
    stripe::verify_webhook_signature(&body, sig_header, secret, now).map_err(|e| {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        AppError::new(ErrorCode::WebhookSignatureInvalid)
    })?;

    let event: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        AppError::new(ErrorCode::WebhookPayloadInvalid)
    })?;

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type, "Received Stripe webhook");

    if event_type == CHECKOUT_COMPLETED {
        handle_checkout_completed(&state, &event).await?;
    } else {
        tracing::debug!(event_type, "Unhandled webhook event type");
    }

    Ok(Json(json!({ "status": "ok" })))
}

/// `metadata.order_id` arrives as a string from checkout sessions we create,
/// but hand-built test events sometimes carry a number.
fn order_id_from(session: &Value) -> Option<i64> {
    match &session["metadata"]["order_id"] {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// checkout.session.completed → mark the referenced order as paid
async fn handle_checkout_completed(state: &AppState, event: &Value) -> Result<(), AppError> {
    let session = &event["data"]["object"];
    let Some(order_id) = order_id_from(session) else {
        tracing::warn!("checkout.session.completed without a usable order_id");
        return Ok(());
    };
    let payment_intent = session["payment_intent"].as_str();

    reconciler::handle_payment_completed(&state.db, state.paid_policy, order_id, payment_intent)
        .await
        .map_err(internal)?;
    Ok(())
}
