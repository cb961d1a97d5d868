use axum::Json;
use axum::extract::State;
use shared::models::{CheckoutSessionRequest, CheckoutSessionResponse};

use crate::api::ApiResult;
use crate::services::checkout;
use crate::state::AppState;

/// POST /api/public/checkout/session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CheckoutSessionRequest>,
) -> ApiResult<CheckoutSessionResponse> {
    let session = checkout::create_checkout_session(
        &state.db,
        state.gateway.as_deref(),
        &state.checkout_urls,
        req.order_id,
    )
    .await?;
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{send, test_state};
    use crate::db::menu::fixtures::{day, item, week};
    use crate::db::orders;
    use crate::services::ledger;
    use shared::models::{FulfillmentMode, OrderCreate, OrderLineRequest};

    #[tokio::test]
    async fn session_created_and_remembered() {
        let (state, gateway) = test_state().await;
        let w = week(&state.db, day(2026, 10, 19), true).await;
        let curry = item(&state.db, w.id, "Curry", 1290).await;
        let order = ledger::create_order(
            &state.db,
            &OrderCreate {
                customer_id: None,
                phone: Some("555-0101".to_string()),
                email: None,
                pickup_or_delivery: FulfillmentMode::Pickup,
                delivery_address: None,
                comment: None,
                items: vec![OrderLineRequest {
                    menu_item_id: curry.id,
                    qty: 3,
                }],
            },
        )
        .await
        .unwrap();

        let (status, body) = send(
            &state,
            "POST",
            "/api/public/checkout/session",
            None,
            Some(json!({"order_id": order.id})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let session_id = format!("cs_test_{}", order.id);
        assert_eq!(body["session_id"], session_id);
        assert_eq!(body["url"], format!("https://checkout.test/{}", order.id));

        let requests = gateway.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].lines[0].qty, 3);
        assert_eq!(requests[0].lines[0].unit_amount_cents, 1290);

        let stored = orders::find_order(&state.db, order.id).await.unwrap().unwrap();
        assert_eq!(stored.stripe_session_id.as_deref(), Some(session_id.as_str()));
    }

    #[tokio::test]
    async fn unknown_order_is_404() {
        let (state, _) = test_state().await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/public/checkout/session",
            None,
            Some(json!({"order_id": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 4001);
    }

    #[tokio::test]
    async fn unconfigured_gateway_is_503() {
        let (mut state, _) = test_state().await;
        state.gateway = None;
        let (status, body) = send(
            &state,
            "POST",
            "/api/public/checkout/session",
            None,
            Some(json!({"order_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], 5002);
    }
}
