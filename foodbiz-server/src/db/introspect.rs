//! Live catalog queries
//!
//! Both functions take a bare connection so the migrator can run them
//! inside its per-table transaction.

use std::collections::BTreeSet;

use sqlx::AnyConnection;

use super::dialect::Dialect;

/// Whether `table` exists (current schema only on PostgreSQL).
pub async fn table_exists(
    conn: &mut AnyConnection,
    dialect: Dialect,
    table: &str,
) -> Result<bool, sqlx::Error> {
    let sql = match dialect {
        Dialect::Sqlite => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
        Dialect::Postgres => {
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_name = $1"
        }
    };
    let count: i64 = sqlx::query_scalar(sql).bind(table).fetch_one(conn).await?;
    Ok(count > 0)
}

/// Lowercased column names of `table`; empty when the table does not exist.
///
/// Callers that need to tell "absent" from "no columns" use [`table_exists`].
pub async fn column_names(
    conn: &mut AnyConnection,
    dialect: Dialect,
    table: &str,
) -> Result<BTreeSet<String>, sqlx::Error> {
    let sql = match dialect {
        Dialect::Sqlite => "SELECT name FROM pragma_table_info($1)",
        Dialect::Postgres => {
            "SELECT CAST(column_name AS TEXT) FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1"
        }
    };
    let names: Vec<String> = sqlx::query_scalar(sql).bind(table).fetch_all(conn).await?;
    Ok(names.into_iter().map(|n| n.to_ascii_lowercase()).collect())
}
