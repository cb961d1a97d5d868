use axum::Json;
use axum::extract::State;
use http::StatusCode;
use shared::error::AppError;
use shared::models::{Order, OrderCreate};

use crate::services::ledger;
use crate::state::AppState;

/// POST /api/public/orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderCreate>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = ledger::create_order(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{send, test_state};
    use crate::db::menu::fixtures::{day, item, week};
    use crate::db::orders;

    #[tokio::test]
    async fn delivery_order_is_priced_server_side() {
        let (state, _) = test_state().await;
        let w = week(&state.db, day(2026, 10, 19), true).await;
        let curry = item(&state.db, w.id, "Curry", 1290).await;
        let rice = item(&state.db, w.id, "Rice", 250).await;

        let (status, body) = send(
            &state,
            "POST",
            "/api/public/orders",
            None,
            Some(json!({
                "phone": "555-0101",
                "pickup_or_delivery": "delivery",
                "delivery_address": "12 Elm St",
                "comment": "extra spicy",
                "items": [
                    {"menu_item_id": curry.id, "qty": 2},
                    {"menu_item_id": rice.id, "qty": 1}
                ]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["delivery_fee_cents"], 500);
        assert_eq!(body["total_cents"], 2 * 1290 + 250 + 500);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["line_total_cents"], 2580);
    }

    #[tokio::test]
    async fn delivery_without_address_is_rejected() {
        let (state, _) = test_state().await;
        let w = week(&state.db, day(2026, 10, 19), true).await;
        let curry = item(&state.db, w.id, "Curry", 1290).await;

        let (status, body) = send(
            &state,
            "POST",
            "/api/public/orders",
            None,
            Some(json!({
                "pickup_or_delivery": "delivery",
                "delivery_address": "   ",
                "items": [{"menu_item_id": curry.id, "qty": 1}]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 4004);
        assert!(orders::list_orders(&state.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_menu_item_is_404() {
        let (state, _) = test_state().await;

        let (status, body) = send(
            &state,
            "POST",
            "/api/public/orders",
            None,
            Some(json!({
                "pickup_or_delivery": "pickup",
                "items": [{"menu_item_id": 999, "qty": 1}]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 6001);
        assert!(orders::list_orders(&state.db).await.unwrap().is_empty());
    }
}
