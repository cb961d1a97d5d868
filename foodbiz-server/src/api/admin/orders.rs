//! Order administration

use axum::Json;
use axum::extract::{Path, State};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatusUpdate, OrderTally};

use crate::api::{ApiResult, internal};
use crate::db::orders;
use crate::state::AppState;

/// GET /api/admin/orders (newest first)
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<Order>> {
    let orders = orders::list_orders(&state.db).await.map_err(internal)?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/tally
pub async fn tally(State(state): State<AppState>) -> ApiResult<OrderTally> {
    let tally = orders::tally(&state.db).await.map_err(internal)?;
    Ok(Json(tally))
}

/// PATCH /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let order = orders::update_status(&state.db, id, req.status)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))?;
    tracing::info!(order_id = id, status = req.status.as_str(), "Order status changed");
    Ok(Json(order))
}
