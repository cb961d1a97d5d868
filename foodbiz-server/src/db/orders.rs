//! Orders and order items
//!
//! Writes that belong to the order ledger take a bare connection so the
//! caller decides the transaction; reads and single-statement updates take
//! the [`Database`].

use std::collections::HashMap;

use shared::models::{
    DeliveryStop, FulfillmentMode, ItemCount, Order, OrderItem, OrderStatus, OrderTally,
    SpecialRequest,
};
use shared::util::{format_sql_timestamp, now_naive};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};

use super::dialect::Dialect;
use super::{Database, get_timestamp};

const ORDER_COLUMNS: &str = "id, customer_id, phone, email, pickup_or_delivery, delivery_address, \
     delivery_fee_cents, comment, total_cents, status, stripe_session_id, payment_intent_id, \
     CAST(created_at AS TEXT) AS created_at";

const ITEM_COLUMNS: &str = "id, order_id, menu_item_id, qty, line_total_cents";

/// Statuses from which a payment completion may move an order to `PAID`.
pub const PAYABLE_STATUSES: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Confirmed];

/// Order shell fields, already validated
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub customer_id: Option<i64>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub mode: FulfillmentMode,
    pub delivery_address: Option<&'a str>,
    pub comment: Option<&'a str>,
}

/// One line of a checkout session, priced from the live menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount_cents: i64,
    pub qty: i64,
}

fn decode_err(column: &str, raw: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unexpected value in column {column}: {raw}").into())
}

fn order_from_row(row: &AnyRow) -> Result<Order, sqlx::Error> {
    let mode: String = row.try_get("pickup_or_delivery")?;
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        pickup_or_delivery: FulfillmentMode::parse(&mode)
            .ok_or_else(|| decode_err("pickup_or_delivery", &mode))?,
        delivery_address: row.try_get("delivery_address")?,
        delivery_fee_cents: row.try_get("delivery_fee_cents")?,
        comment: row.try_get("comment")?,
        total_cents: row.try_get("total_cents")?,
        status: OrderStatus::parse(&status).ok_or_else(|| decode_err("status", &status))?,
        stripe_session_id: row.try_get("stripe_session_id")?,
        payment_intent_id: row.try_get("payment_intent_id")?,
        created_at: get_timestamp(row, "created_at")?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &AnyRow) -> Result<OrderItem, sqlx::Error> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        qty: row.try_get("qty")?,
        line_total_cents: row.try_get("line_total_cents")?,
    })
}

// =========================================================================
// Ledger writes (caller-owned transaction)
// =========================================================================

/// Insert the order shell with a zero total and `PENDING` status.
pub async fn insert_shell(
    conn: &mut AnyConnection,
    dialect: Dialect,
    order: &NewOrder<'_>,
) -> Result<i64, sqlx::Error> {
    let ts = dialect.timestamp_param(8);
    let sql = format!(
        "INSERT INTO orders (customer_id, phone, email, pickup_or_delivery, delivery_address,
             delivery_fee_cents, comment, total_cents, status, created_at)
         VALUES ($1, $2, $3, $4, $5, 0, $6, 0, $7, {ts}) RETURNING id"
    );
    sqlx::query_scalar(&sql)
        .bind(order.customer_id)
        .bind(order.phone)
        .bind(order.email)
        .bind(order.mode.as_str())
        .bind(order.delivery_address)
        .bind(order.comment)
        .bind(OrderStatus::Pending.as_str())
        .bind(format_sql_timestamp(&now_naive()))
        .fetch_one(conn)
        .await
}

/// Current authoritative price of a menu item.
///
/// Legacy rows without a price or a week cannot be ordered and read as absent.
pub async fn menu_item_price(
    conn: &mut AnyConnection,
    menu_item_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT price_cents FROM menu_items
         WHERE id = $1 AND price_cents IS NOT NULL AND menu_week_id IS NOT NULL",
    )
        .bind(menu_item_id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_item(
    conn: &mut AnyConnection,
    order_id: i64,
    menu_item_id: i64,
    qty: i64,
    line_total_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (order_id, menu_item_id, qty, line_total_cents)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(order_id)
    .bind(menu_item_id)
    .bind(qty)
    .bind(line_total_cents)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_totals(
    conn: &mut AnyConnection,
    order_id: i64,
    delivery_fee_cents: i64,
    total_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET delivery_fee_cents = $1, total_cents = $2 WHERE id = $3")
        .bind(delivery_fee_cents)
        .bind(total_cents)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

// =========================================================================
// Reads
// =========================================================================

/// Order with its items in insertion order.
pub async fn find_order(db: &Database, id: i64) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&db.pool).await? else {
        return Ok(None);
    };
    let mut order = order_from_row(&row)?;

    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
    let rows = sqlx::query(&sql).bind(id).fetch_all(&db.pool).await?;
    order.items = rows.iter().map(item_from_row).collect::<Result<_, _>>()?;
    Ok(Some(order))
}

/// Every order, newest first, with items.
pub async fn list_orders(db: &Database) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query(&sql).fetch_all(&db.pool).await?;
    let mut orders = rows.iter().map(order_from_row).collect::<Result<Vec<_>, _>>()?;

    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items ORDER BY id");
    let rows = sqlx::query(&sql).fetch_all(&db.pool).await?;
    let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in &rows {
        let item = item_from_row(row)?;
        by_order.entry(item.order_id).or_default().push(item);
    }
    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
}

/// Raw stored status, `None` when the order does not exist.
pub async fn status_of(db: &Database, id: i64) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&db.pool)
        .await
}

/// Checkout lines for an order, priced from the live menu item.
///
/// Items whose menu item no longer exists or has no price are skipped.
pub async fn checkout_lines(db: &Database, order_id: i64) -> Result<Vec<CheckoutLine>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT m.name AS name, m.price_cents AS price_cents, oi.qty AS qty
         FROM order_items oi
         JOIN menu_items m ON m.id = oi.menu_item_id
         WHERE oi.order_id = $1 AND m.price_cents IS NOT NULL
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&db.pool)
    .await?;

    rows.iter()
        .map(|row| {
            let name: Option<String> = row.try_get("name")?;
            Ok(CheckoutLine {
                name: name.unwrap_or_default(),
                unit_amount_cents: row.try_get("price_cents")?,
                qty: row.try_get("qty")?,
            })
        })
        .collect()
}

// =========================================================================
// Status updates
// =========================================================================

/// Administrative status change. Returns `None` when the order does not exist.
pub async fn update_status(
    db: &Database,
    id: i64,
    status: OrderStatus,
) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(&db.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_order(db, id).await
}

pub async fn set_checkout_session(
    db: &Database,
    id: i64,
    session_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET stripe_session_id = $1 WHERE id = $2")
        .bind(session_id)
        .bind(id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// Move an order to `PAID` only from a payable status. Returns rows changed.
///
/// An absent `payment_intent_id` keeps the stored reference.
pub async fn mark_paid_if_payable(
    db: &Database,
    id: i64,
    payment_intent_id: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let payable: Vec<String> = PAYABLE_STATUSES
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect();
    let sql = format!(
        "UPDATE orders SET status = $1, payment_intent_id = COALESCE($2, payment_intent_id)
         WHERE id = $3 AND status IN ({})",
        payable.join(", ")
    );
    let result = sqlx::query(&sql)
        .bind(OrderStatus::Paid.as_str())
        .bind(payment_intent_id)
        .bind(id)
        .execute(&db.pool)
        .await?;
    Ok(result.rows_affected())
}

/// Move an order to `PAID` regardless of its current status. Returns rows changed.
pub async fn mark_paid_unconditionally(
    db: &Database,
    id: i64,
    payment_intent_id: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = $1, payment_intent_id = COALESCE($2, payment_intent_id)
         WHERE id = $3",
    )
    .bind(OrderStatus::Paid.as_str())
    .bind(payment_intent_id)
    .bind(id)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected())
}

// =========================================================================
// Tally
// =========================================================================

/// Kitchen and delivery report over every order.
pub async fn tally(db: &Database) -> Result<OrderTally, sqlx::Error> {
    let (total_orders, pickup_count, delivery_count): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*),
                CAST(COALESCE(SUM(CASE WHEN pickup_or_delivery = 'pickup' THEN 1 ELSE 0 END), 0) AS BIGINT),
                CAST(COALESCE(SUM(CASE WHEN pickup_or_delivery = 'delivery' THEN 1 ELSE 0 END), 0) AS BIGINT)
         FROM orders",
    )
    .fetch_one(&db.pool)
    .await?;

    let item_counts = sqlx::query_as::<_, (i64, i64)>(
        "SELECT menu_item_id, CAST(SUM(qty) AS BIGINT)
         FROM order_items GROUP BY menu_item_id ORDER BY menu_item_id",
    )
    .fetch_all(&db.pool)
    .await?
    .into_iter()
    .map(|(menu_item_id, total_qty)| ItemCount {
        menu_item_id,
        total_qty,
    })
    .collect();

    let special_requests = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, comment FROM orders
         WHERE comment IS NOT NULL AND comment <> '' ORDER BY id",
    )
    .fetch_all(&db.pool)
    .await?
    .into_iter()
    .map(|(order_id, comment)| SpecialRequest { order_id, comment })
    .collect();

    let delivery_list = sqlx::query(
        "SELECT o.id AS order_id, c.name AS name, COALESCE(c.phone, o.phone) AS phone,
                o.delivery_address AS address, o.comment AS comment
         FROM orders o
         LEFT JOIN customers c ON c.id = o.customer_id
         WHERE o.pickup_or_delivery = 'delivery'
         ORDER BY o.id",
    )
    .fetch_all(&db.pool)
    .await?
    .iter()
    .map(|row| {
        Ok(DeliveryStop {
            order_id: row.try_get("order_id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            comment: row.try_get("comment")?,
        })
    })
    .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(OrderTally {
        total_orders,
        pickup_count,
        delivery_count,
        item_counts,
        special_requests,
        delivery_list,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Insert an order row directly, bypassing the ledger.
    pub async fn raw_order(db: &Database, mode: FulfillmentMode, status: OrderStatus) -> i64 {
        let mut conn = db.pool.acquire().await.unwrap();
        let id = insert_shell(
            &mut conn,
            db.dialect,
            &NewOrder {
                customer_id: None,
                phone: Some("555-0199"),
                email: None,
                mode,
                delivery_address: None,
                comment: None,
            },
        )
        .await
        .unwrap();
        sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *conn)
            .await
            .unwrap();
        id
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::raw_order;
    use super::*;
    use crate::db::menu::fixtures::{day, item, week};
    use crate::db::test_support::{loose_legacy_db, memory_db};

    #[tokio::test]
    async fn shell_items_and_totals() {
        let db = memory_db().await;
        let w = week(&db, day(2026, 10, 19), true).await;
        let tacos = item(&db, w.id, "Tacos", 1290).await;

        let mut conn = db.pool.acquire().await.unwrap();
        let id = insert_shell(
            &mut conn,
            db.dialect,
            &NewOrder {
                customer_id: None,
                phone: Some("555-0100"),
                email: Some("ana@example.com"),
                mode: FulfillmentMode::Pickup,
                delivery_address: None,
                comment: Some("extra salsa"),
            },
        )
        .await
        .unwrap();
        assert_eq!(menu_item_price(&mut conn, tacos.id).await.unwrap(), Some(1290));
        assert_eq!(menu_item_price(&mut conn, 999).await.unwrap(), None);
        insert_item(&mut conn, id, tacos.id, 2, 2580).await.unwrap();
        set_totals(&mut conn, id, 0, 2580).await.unwrap();
        drop(conn);

        let order = find_order(&db, id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 2580);
        assert_eq!(order.comment.as_deref(), Some("extra salsa"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total_cents, 2580);
        assert!(order.created_at.is_some());
    }

    #[tokio::test]
    async fn zero_quantity_rejected_by_schema() {
        let db = memory_db().await;
        let w = week(&db, day(2026, 10, 19), true).await;
        let tacos = item(&db, w.id, "Tacos", 1290).await;
        let id = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;

        let mut conn = db.pool.acquire().await.unwrap();
        assert!(insert_item(&mut conn, id, tacos.id, 0, 0).await.is_err());
    }

    #[tokio::test]
    async fn conditional_paid_update_respects_status() {
        let db = memory_db().await;
        let pending = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;
        let completed = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Completed).await;

        assert_eq!(mark_paid_if_payable(&db, pending, Some("pi_1")).await.unwrap(), 1);
        assert_eq!(mark_paid_if_payable(&db, pending, Some("pi_1")).await.unwrap(), 0);
        assert_eq!(mark_paid_if_payable(&db, completed, Some("pi_2")).await.unwrap(), 0);
        assert_eq!(status_of(&db, completed).await.unwrap().as_deref(), Some("COMPLETED"));

        assert_eq!(mark_paid_unconditionally(&db, completed, None).await.unwrap(), 1);
        let order = find_order(&db, completed).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_intent_id, None);
        assert_eq!(status_of(&db, 999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_newest_first_with_items() {
        let db = memory_db().await;
        let w = week(&db, day(2026, 10, 19), true).await;
        let bowl = item(&db, w.id, "Bowl", 1390).await;
        let first = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;
        let second = raw_order(&db, FulfillmentMode::Delivery, OrderStatus::Pending).await;
        let mut conn = db.pool.acquire().await.unwrap();
        insert_item(&mut conn, first, bowl.id, 1, 1390).await.unwrap();
        drop(conn);

        let orders = list_orders(&db).await.unwrap();
        assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(orders[1].items.len(), 1);
        assert!(orders[0].items.is_empty());
    }

    #[tokio::test]
    async fn update_status_and_session() {
        let db = memory_db().await;
        let id = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;

        let order = update_status(&db, id, OrderStatus::Confirmed).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(update_status(&db, 404, OrderStatus::Cancelled).await.unwrap(), None);

        set_checkout_session(&db, id, "cs_test_1").await.unwrap();
        let order = find_order(&db, id).await.unwrap().unwrap();
        assert_eq!(order.stripe_session_id.as_deref(), Some("cs_test_1"));
    }

    #[tokio::test]
    async fn checkout_lines_use_live_price_and_skip_vanished_items() {
        let db = memory_db().await;
        let w = week(&db, day(2026, 10, 19), true).await;
        let tacos = item(&db, w.id, "Tacos", 1290).await;
        let id = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;
        let mut conn = db.pool.acquire().await.unwrap();
        insert_item(&mut conn, id, tacos.id, 2, 2580).await.unwrap();
        sqlx::query("UPDATE menu_items SET price_cents = 1350 WHERE id = $1")
            .bind(tacos.id)
            .execute(&mut *conn)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(
            checkout_lines(&db, id).await.unwrap(),
            vec![CheckoutLine {
                name: "Tacos".to_string(),
                unit_amount_cents: 1350,
                qty: 2,
            }]
        );
        assert!(checkout_lines(&db, id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_items_without_price_or_week_are_not_sold() {
        let db = loose_legacy_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        assert_eq!(menu_item_price(&mut conn, 1).await.unwrap(), Some(1290));
        assert_eq!(menu_item_price(&mut conn, 2).await.unwrap(), None);
        assert_eq!(menu_item_price(&mut conn, 3).await.unwrap(), None);
        drop(conn);

        let id = raw_order(&db, FulfillmentMode::Pickup, OrderStatus::Pending).await;
        let mut conn = db.pool.acquire().await.unwrap();
        insert_item(&mut conn, id, 1, 1, 1290).await.unwrap();
        insert_item(&mut conn, id, 3, 2, 0).await.unwrap();
        drop(conn);

        assert_eq!(
            checkout_lines(&db, id).await.unwrap(),
            vec![CheckoutLine {
                name: "Tacos".to_string(),
                unit_amount_cents: 1290,
                qty: 1,
            }]
        );
    }
}
