//! Current schema definition

use sqlx::AnyPool;

use super::dialect::Dialect;

/// Tables in dependency order (parents first).
pub const TABLES: [&str; 5] = ["menu_weeks", "menu_items", "customers", "orders", "order_items"];

fn create_statements(dialect: Dialect) -> Vec<String> {
    let t = dialect.tokens();
    let (id, dt, yes, no) = (t.id_column, t.datetime_type, t.true_literal, t.false_literal);

    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS menu_weeks (
                id {id},
                selling_days TEXT NOT NULL DEFAULT 'Mon,Wed,Fri',
                status TEXT NOT NULL DEFAULT 'OPEN',
                published BOOLEAN NOT NULL DEFAULT {no},
                starts_at {dt} NOT NULL,
                created_at {dt} NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS menu_items (
                id {id},
                menu_week_id BIGINT NOT NULL REFERENCES menu_weeks(id),
                name TEXT NOT NULL,
                description TEXT,
                photo_url TEXT,
                price_cents BIGINT NOT NULL,
                available BOOLEAN NOT NULL DEFAULT {yes},
                created_at {dt} DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS customers (
                id {id},
                name TEXT,
                phone TEXT,
                email TEXT,
                sms_opt_in BOOLEAN NOT NULL DEFAULT {no},
                email_opt_in BOOLEAN NOT NULL DEFAULT {no},
                created_at {dt} DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS orders (
                id {id},
                customer_id BIGINT REFERENCES customers(id),
                phone TEXT,
                email TEXT,
                pickup_or_delivery TEXT NOT NULL,
                delivery_address TEXT,
                delivery_fee_cents BIGINT NOT NULL DEFAULT 0,
                comment TEXT,
                total_cents BIGINT NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'PENDING',
                stripe_session_id TEXT,
                payment_intent_id TEXT,
                created_at {dt} NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS order_items (
                id {id},
                order_id BIGINT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                menu_item_id BIGINT NOT NULL REFERENCES menu_items(id),
                qty BIGINT NOT NULL CHECK (qty >= 1),
                line_total_cents BIGINT NOT NULL
            )"
        ),
        // Only columns every historical shape already has; the migrator runs after this.
        "CREATE INDEX IF NOT EXISTS idx_menu_items_week ON menu_items(menu_week_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)".to_string(),
    ]
}

/// Create any missing table. Existing tables are left to the compatibility migrator.
pub async fn create_schema(pool: &AnyPool, dialect: Dialect) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for sql in create_statements(dialect) {
        sqlx::query(&sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Drop every table. Destructive; only called when the reset flag is set.
pub async fn reset_schema(pool: &AnyPool, dialect: Dialect) -> Result<(), sqlx::Error> {
    let suffix = dialect.tokens().drop_suffix;
    let mut tx = pool.begin().await?;
    for table in TABLES.iter().rev() {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}{suffix}"))
            .execute(&mut *tx)
            .await?;
        tracing::warn!(table, "Dropped table");
    }
    tx.commit().await?;
    Ok(())
}
