//! Checkout session creation

use shared::error::{AppError, ErrorCode};
use shared::models::CheckoutSessionResponse;

use crate::db::{Database, orders};
use crate::error::ServiceResult;
use crate::stripe::{CheckoutRequest, PaymentGateway};

/// Where the hosted checkout sends the customer afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Open a provider checkout for an existing order and remember its session id.
///
/// Line items are priced from the live menu items. Fails with
/// `PaymentNotConfigured` when no gateway is configured.
pub async fn create_checkout_session(
    db: &Database,
    gateway: Option<&dyn PaymentGateway>,
    urls: &CheckoutUrls,
    order_id: i64,
) -> ServiceResult<CheckoutSessionResponse> {
    let gateway = gateway.ok_or_else(|| AppError::new(ErrorCode::PaymentNotConfigured))?;

    let order = orders::find_order(db, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id))?;

    if !orders::PAYABLE_STATUSES.contains(&order.status) {
        return Err(AppError::with_message(
            ErrorCode::OrderInvalidStatus,
            format!("Order is {} and cannot be paid", order.status.as_str()),
        )
        .with_detail("order_id", order_id)
        .into());
    }

    let lines = orders::checkout_lines(db, order_id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::CheckoutNoItems)
            .with_detail("order_id", order_id)
            .into());
    }

    let request = CheckoutRequest {
        order_id,
        lines,
        success_url: urls.success_url.clone(),
        cancel_url: urls.cancel_url.clone(),
    };
    let session = gateway
        .create_checkout_session(&request)
        .await
        .map_err(|e| {
            tracing::error!(order_id, error = %e, "Checkout session creation failed");
            AppError::new(ErrorCode::PaymentProviderError)
        })?;

    orders::set_checkout_session(db, order_id, &session.id).await?;
    tracing::info!(order_id, session_id = %session.id, "Checkout session created");

    Ok(CheckoutSessionResponse {
        url: session.url,
        session_id: session.id,
    })
}
