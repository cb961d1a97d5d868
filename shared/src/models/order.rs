//! Order Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pickup or delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMode {
    Pickup,
    Delivery,
}

impl FulfillmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pickup" => Some(Self::Pickup),
            "delivery" => Some(Self::Delivery),
            _ => None,
        }
    }
}

/// Order lifecycle status
///
/// `PENDING` at creation, `PAID` only from a verified payment event,
/// `CONFIRMED`/`COMPLETED`/`CANCELLED` by admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Paid,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Paid => "PAID",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Terminal administrative states a payment event must not override.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Order entity with its line items in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub pickup_or_delivery: FulfillmentMode,
    pub delivery_address: Option<String>,
    pub delivery_fee_cents: i64,
    pub comment: Option<String>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub stripe_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub items: Vec<OrderItem>,
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub qty: i64,
    /// qty x menu item price at order time
    pub line_total_cents: i64,
}

/// Requested line; the price is always read from the menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    pub qty: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_id: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub pickup_or_delivery: FulfillmentMode,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

/// Admin status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Admin summary of all orders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderTally {
    pub total_orders: i64,
    pub pickup_count: i64,
    pub delivery_count: i64,
    pub item_counts: Vec<ItemCount>,
    pub special_requests: Vec<SpecialRequest>,
    pub delivery_list: Vec<DeliveryStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCount {
    pub menu_item_id: i64,
    pub total_qty: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialRequest {
    pub order_id: i64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStop {
    pub order_id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub comment: Option<String>,
}

/// Checkout session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub order_id: i64,
}

/// Checkout session created at the payment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(OrderStatus::parse("paid"), Some(OrderStatus::Paid));
        assert_eq!(OrderStatus::parse(" CANCELLED "), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn only_completed_and_cancelled_are_terminal() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_terminal)
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Completed, OrderStatus::Cancelled]);
    }

    #[test]
    fn create_payload_uses_lowercase_mode() {
        let payload: OrderCreate = serde_json::from_str(
            r#"{"phone":"555","pickup_or_delivery":"delivery","delivery_address":"1 Main",
                "items":[{"menu_item_id":1,"qty":2}]}"#,
        )
        .unwrap();
        assert_eq!(payload.pickup_or_delivery, FulfillmentMode::Delivery);
        assert_eq!(payload.items[0].qty, 2);
        assert!(payload.customer_id.is_none());

        assert!(serde_json::from_str::<OrderCreate>(
            r#"{"pickup_or_delivery":"drone","items":[]}"#
        )
        .is_err());
    }
}
