//! Order ledger
//!
//! Creates an order and its items in one transaction. Prices always come
//! from the menu item row at order time; the request never carries a price.

use shared::error::{AppError, ErrorCode};
use shared::models::{FulfillmentMode, Order, OrderCreate};

use crate::db::orders::{self, NewOrder};
use crate::db::{Database, customers};
use crate::error::ServiceResult;

/// Flat surcharge for delivery orders, in cents
pub const DELIVERY_FEE_CENTS: i64 = 500;

pub fn delivery_fee(mode: FulfillmentMode) -> i64 {
    match mode {
        FulfillmentMode::Pickup => 0,
        FulfillmentMode::Delivery => DELIVERY_FEE_CENTS,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Request checks that need no database access.
///
/// Returns the address to store: required for delivery, always `None` for pickup.
fn validate(payload: &OrderCreate) -> Result<Option<&str>, AppError> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if let Some(line) = payload.items.iter().find(|line| line.qty < 1) {
        return Err(AppError::new(ErrorCode::OrderInvalidQuantity)
            .with_detail("menu_item_id", line.menu_item_id)
            .with_detail("qty", line.qty));
    }
    match payload.pickup_or_delivery {
        FulfillmentMode::Pickup => Ok(None),
        FulfillmentMode::Delivery => non_blank(payload.delivery_address.as_deref())
            .map(Some)
            .ok_or_else(|| AppError::new(ErrorCode::DeliveryAddressRequired)),
    }
}

fn out_of_range() -> AppError {
    AppError::with_message(ErrorCode::ValueOutOfRange, "Order total is out of range")
}

/// Create an order. Nothing is written unless every line resolves.
pub async fn create_order(db: &Database, payload: &OrderCreate) -> ServiceResult<Order> {
    let delivery_address = validate(payload)?;

    if let Some(customer_id) = payload.customer_id
        && customers::find_customer(db, customer_id).await?.is_none()
    {
        return Err(AppError::new(ErrorCode::CustomerNotFound)
            .with_detail("customer_id", customer_id)
            .into());
    }

    let mode = payload.pickup_or_delivery;
    let shell = NewOrder {
        customer_id: payload.customer_id,
        phone: non_blank(payload.phone.as_deref()),
        email: non_blank(payload.email.as_deref()),
        mode,
        delivery_address,
        comment: non_blank(payload.comment.as_deref()),
    };

    let mut tx = db.pool.begin().await?;
    let order_id = orders::insert_shell(&mut tx, db.dialect, &shell).await?;

    let mut subtotal: i64 = 0;
    for line in &payload.items {
        let price = orders::menu_item_price(&mut tx, line.menu_item_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemNotFound)
                    .with_detail("menu_item_id", line.menu_item_id)
            })?;
        let line_total = price
            .checked_mul(line.qty)
            .ok_or_else(|| out_of_range().with_detail("menu_item_id", line.menu_item_id))?;
        orders::insert_item(&mut tx, order_id, line.menu_item_id, line.qty, line_total).await?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| out_of_range().with_detail("menu_item_id", line.menu_item_id))?;
    }

    let fee = delivery_fee(mode);
    let total = subtotal
        .checked_add(fee)
        .ok_or_else(out_of_range)?;
    orders::set_totals(&mut tx, order_id, fee, total).await?;
    tx.commit().await?;

    tracing::info!(
        order_id,
        mode = mode.as_str(),
        lines = payload.items.len(),
        total_cents = total,
        "Order created"
    );

    orders::find_order(db, order_id)
        .await?
        .ok_or_else(|| sqlx::Error::RowNotFound.into())
}
