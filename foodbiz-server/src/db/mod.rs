//! Database access layer
//!
//! One `AnyPool` serves SQLite and PostgreSQL. Startup runs, in order:
//! connect, detect dialect, optional reset, create missing tables,
//! compatibility migration, optional demo seed.

pub mod compat;
pub mod customers;
pub mod dialect;
pub mod introspect;
pub mod menu;
pub mod orders;
pub mod schema;
pub mod seed;

use std::sync::Arc;

use chrono::NaiveDateTime;
use shared::util::parse_sql_timestamp;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use thiserror::Error;

use compat::{LegacyMirrors, MigrationError, MigrationReport};
use dialect::{Dialect, UnsupportedDialect};

/// Pool plus the facts about the live schema learned at startup
#[derive(Debug, Clone)]
pub struct Database {
    pub pool: AnyPool,
    pub dialect: Dialect,
    pub mirrors: Arc<LegacyMirrors>,
}

/// Startup failure; the process must not serve traffic.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error(transparent)]
    Dialect(#[from] UnsupportedDialect),
    #[error("schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("demo seed failed: {0}")]
    Seed(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    /// Drop every table first (development only)
    pub reset: bool,
    pub seed_demo: bool,
}

/// Open a pool for `url` (`sqlite://...` or `postgres://...`).
///
/// SQLite connections get foreign key enforcement switched on.
pub async fn connect(url: &str, max_connections: u32) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                if Dialect::detect(conn.backend_name()) == Ok(Dialect::Sqlite) {
                    sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(url)
        .await
}

/// Ask a live connection which engine it talks to.
pub async fn detect_dialect(pool: &AnyPool) -> Result<Dialect, BootstrapError> {
    let conn = pool.acquire().await.map_err(BootstrapError::Connect)?;
    Ok(Dialect::detect(conn.backend_name())?)
}

/// Bring the schema to the current shape and return the ready database handle.
pub async fn bootstrap(
    pool: AnyPool,
    options: BootstrapOptions,
) -> Result<(Database, MigrationReport), BootstrapError> {
    let dialect = detect_dialect(&pool).await?;
    tracing::info!(dialect = %dialect, "Database connection established");

    if options.reset {
        tracing::warn!("RESET_DB_ON_STARTUP is set, dropping all tables");
        schema::reset_schema(&pool, dialect)
            .await
            .map_err(BootstrapError::Schema)?;
    }

    schema::create_schema(&pool, dialect)
        .await
        .map_err(BootstrapError::Schema)?;

    let report = compat::migrate(&pool, dialect).await?;
    for (table, warning) in report.warnings() {
        tracing::warn!(
            table,
            column = warning.column,
            error = %warning.error,
            "Column left unmigrated"
        );
    }

    let db = Database {
        pool,
        dialect,
        mirrors: Arc::new(report.mirrors()),
    };

    if options.seed_demo {
        let seeded = seed::seed_demo_menu_if_empty(&db)
            .await
            .map_err(BootstrapError::Seed)?;
        if seeded {
            tracing::info!("Seeded demo menu");
        }
    }

    Ok((db, report))
}

// =========================================================================
// Statement builders
//
// Writes are built from `(column, placeholder)` pairs so the legacy
// mirrors reported by the migrator can be appended before rendering.
// =========================================================================

pub(crate) fn insert_sql(table: &str, columns: &[(&'static str, String)]) -> String {
    let names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
    let values: Vec<&str> = columns.iter().map(|(_, p)| p.as_str()).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
        names.join(", "),
        values.join(", ")
    )
}

pub(crate) fn update_sql(table: &str, columns: &[(&'static str, String)], id_param: usize) -> String {
    let sets: Vec<String> = columns.iter().map(|(c, p)| format!("{c} = {p}")).collect();
    format!("UPDATE {table} SET {} WHERE id = ${id_param}", sets.join(", "))
}

// =========================================================================
// Row helpers
//
// Booleans are selected as CAST(col AS INTEGER) and timestamps as
// CAST(col AS TEXT); the Any driver cannot decode the engines' native types.
// =========================================================================

pub(crate) fn get_bool(row: &AnyRow, column: &str) -> Result<bool, sqlx::Error> {
    let value: Option<i64> = row.try_get(column)?;
    Ok(value.unwrap_or(0) != 0)
}

pub(crate) fn get_timestamp(
    row: &AnyRow,
    column: &str,
) -> Result<Option<NaiveDateTime>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_sql_timestamp(&text).map(Some).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid timestamp in column {column}: {text}").into())
        }),
    }
}

pub(crate) fn get_required_timestamp(
    row: &AnyRow,
    column: &str,
) -> Result<NaiveDateTime, sqlx::Error> {
    get_timestamp(row, column)?
        .ok_or_else(|| sqlx::Error::Decode(format!("column {column} is null").into()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Single-connection in-memory SQLite pool (the database lives as long as the connection).
    pub async fn memory_pool() -> AnyPool {
        connect("sqlite::memory:", 1).await.unwrap()
    }

    /// Fresh in-memory database with the current schema.
    pub async fn memory_db() -> Database {
        let (db, _) = bootstrap(memory_pool().await, BootstrapOptions::default())
            .await
            .unwrap();
        db
    }

    /// Legacy menu tables that allowed NULL week and price, patched by bootstrap.
    ///
    /// Item 1 is complete, item 2 has no week and item 3 has no price.
    pub async fn loose_legacy_db() -> Database {
        let pool = memory_pool().await;
        for sql in [
            "CREATE TABLE menu_weeks (
                id INTEGER PRIMARY KEY,
                week_start_date DATE NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT 0
            )",
            "CREATE TABLE menu_items (
                id INTEGER PRIMARY KEY,
                menu_week_id INTEGER REFERENCES menu_weeks(id),
                name VARCHAR NOT NULL,
                description VARCHAR,
                price_cents INTEGER,
                is_active BOOLEAN NOT NULL DEFAULT 1
            )",
            "INSERT INTO menu_weeks (id, week_start_date, is_published)
             VALUES (1, '2026-10-19 00:00:00', 1)",
            "INSERT INTO menu_items (id, menu_week_id, name, price_cents) VALUES
                (1, 1, 'Tacos', 1290),
                (2, NULL, 'Orphan', 800),
                (3, 1, 'Unpriced', NULL)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }
        let (db, _) = bootstrap(pool, BootstrapOptions::default()).await.unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::memory_pool;

    #[test]
    fn statement_builders() {
        let cols = vec![
            ("starts_at", "$1".to_string()),
            ("week_start_date", "$1".to_string()),
            ("published", "$2".to_string()),
        ];
        assert_eq!(
            insert_sql("menu_weeks", &cols),
            "INSERT INTO menu_weeks (starts_at, week_start_date, published) VALUES ($1, $1, $2) RETURNING id"
        );
        assert_eq!(
            update_sql("menu_weeks", &cols, 3),
            "UPDATE menu_weeks SET starts_at = $1, week_start_date = $1, published = $2 WHERE id = $3"
        );
    }

    #[tokio::test]
    async fn detects_sqlite() {
        let pool = memory_pool().await;
        assert_eq!(detect_dialect(&pool).await.unwrap(), Dialect::Sqlite);
    }

    #[tokio::test]
    async fn foreign_keys_enforced() {
        let pool = memory_pool().await;
        let on: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(on, 1);
    }

    #[tokio::test]
    async fn bootstrap_fresh_database_needs_no_patching() {
        let (db, report) = bootstrap(memory_pool().await, BootstrapOptions::default())
            .await
            .unwrap();
        assert_eq!(db.dialect, Dialect::Sqlite);
        assert!(db.mirrors.is_empty());
        for table in &report.tables {
            assert!(!table.skipped);
            assert!(table.added.is_empty());
            assert!(table.warnings.is_empty());
        }
    }

    #[tokio::test]
    async fn bootstrap_with_seed_is_repeatable() {
        let pool = memory_pool().await;
        let options = BootstrapOptions {
            reset: false,
            seed_demo: true,
        };
        let (db, _) = bootstrap(pool.clone(), options).await.unwrap();
        bootstrap(pool, options).await.unwrap();

        let weeks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_weeks")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!((weeks, items), (1, 8));
    }

    #[tokio::test]
    async fn file_database_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("foodbiz.db").display());
        let options = BootstrapOptions {
            reset: false,
            seed_demo: true,
        };

        let pool = connect(&url, 2).await.unwrap();
        bootstrap(pool.clone(), options).await.unwrap();
        pool.close().await;

        let (db, report) = bootstrap(connect(&url, 2).await.unwrap(), options)
            .await
            .unwrap();
        assert!(report.tables.iter().all(|t| t.added.is_empty()));
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(items, 8);
    }

    #[tokio::test]
    async fn reset_drops_existing_rows() {
        let pool = memory_pool().await;
        let seed = BootstrapOptions {
            reset: false,
            seed_demo: true,
        };
        bootstrap(pool.clone(), seed).await.unwrap();

        let (db, _) = bootstrap(
            pool,
            BootstrapOptions {
                reset: true,
                seed_demo: false,
            },
        )
        .await
        .unwrap();
        let weeks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_weeks")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(weeks, 0);
    }
}
