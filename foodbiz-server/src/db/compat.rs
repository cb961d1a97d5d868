//! Startup compatibility migration for menu tables
//!
//! Databases created by older releases carry `menu_weeks` and `menu_items`
//! in an earlier shape: `week_start_date`/`is_published` instead of
//! `starts_at`/`published`, and `is_active`/`is_sold_out`/`qty_sold` instead
//! of `available`. This module brings such a table up to the current shape
//! without dropping anything and can run on every start.
//!
//! Per governed table, inside one transaction:
//! 1. skip when the table does not exist (fresh schemas need nothing);
//! 2. add each missing column from the table's additive list, each inside a
//!    savepoint so one failed `ADD COLUMN` leaves the others untouched;
//! 3. run one backfill `UPDATE` reconciling every canonical column with its
//!    legacy sources (first non-null wins, literal fallback last).
//!
//! Legacy column names appear only in the static tables below. The write path
//! learns which legacy columns still need to be filled through [`LegacyMirrors`].

use std::collections::BTreeSet;

use sqlx::{AnyConnection, AnyPool, Connection};
use thiserror::Error;

use super::dialect::{Dialect, SyntaxTokens};
use super::introspect;

// =========================================================================
// Table definitions
// =========================================================================

/// Type and default of a column added to an existing table.
///
/// Timestamps are always added nullable and filled by the backfill: SQLite
/// refuses `ADD COLUMN` with a non-constant default such as `CURRENT_TIMESTAMP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text { default: Option<&'static str> },
    Bool { default: bool },
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct AdditiveColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// One entry of a first-non-null precedence chain.
#[derive(Debug, Clone, Copy)]
pub enum Candidate {
    /// The column value as is
    Column(&'static str),
    /// The column value, with empty strings treated as null
    NonEmpty(&'static str),
    /// Boolean negation of a flag, null when the flag is null
    Negated(&'static str),
    /// `false` when `sold >= limit` with a limit set, otherwise null
    Exhausted {
        sold: &'static str,
        limit: &'static str,
    },
}

/// Final literal of a precedence chain.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    Now,
    Bool(bool),
    Text(&'static str),
}

/// `target = COALESCE(chain..., fallback)`
#[derive(Debug, Clone, Copy)]
pub struct Reconcile {
    pub target: &'static str,
    pub chain: &'static [Candidate],
    pub fallback: Fallback,
}

/// A legacy column that duplicates a canonical one and must stay in step with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mirror {
    pub legacy: &'static str,
    pub canonical: &'static str,
}

/// A table the migrator is responsible for.
#[derive(Debug, Clone, Copy)]
pub struct GovernedTable {
    pub name: &'static str,
    pub additive: &'static [AdditiveColumn],
    pub reconcile: &'static [Reconcile],
    pub mirrors: &'static [Mirror],
}

pub const MENU_WEEKS: GovernedTable = GovernedTable {
    name: "menu_weeks",
    additive: &[
        AdditiveColumn {
            name: "selling_days",
            kind: ColumnKind::Text {
                default: Some("Mon,Wed,Fri"),
            },
        },
        AdditiveColumn {
            name: "status",
            kind: ColumnKind::Text {
                default: Some("OPEN"),
            },
        },
        AdditiveColumn {
            name: "published",
            kind: ColumnKind::Bool { default: false },
        },
        AdditiveColumn {
            name: "starts_at",
            kind: ColumnKind::Timestamp,
        },
        AdditiveColumn {
            name: "created_at",
            kind: ColumnKind::Timestamp,
        },
    ],
    reconcile: &[
        Reconcile {
            target: "starts_at",
            chain: &[
                Candidate::Column("starts_at"),
                Candidate::Column("week_start_date"),
            ],
            fallback: Fallback::Now,
        },
        Reconcile {
            target: "published",
            chain: &[
                Candidate::Column("published"),
                Candidate::Column("is_published"),
            ],
            fallback: Fallback::Bool(false),
        },
        Reconcile {
            target: "selling_days",
            chain: &[Candidate::NonEmpty("selling_days")],
            fallback: Fallback::Text("Mon,Wed,Fri"),
        },
        Reconcile {
            target: "status",
            chain: &[Candidate::NonEmpty("status")],
            fallback: Fallback::Text("OPEN"),
        },
        Reconcile {
            target: "created_at",
            chain: &[Candidate::Column("created_at")],
            fallback: Fallback::Now,
        },
    ],
    mirrors: &[
        Mirror {
            legacy: "week_start_date",
            canonical: "starts_at",
        },
        Mirror {
            legacy: "is_published",
            canonical: "published",
        },
    ],
};

pub const MENU_ITEMS: GovernedTable = GovernedTable {
    name: "menu_items",
    additive: &[
        AdditiveColumn {
            name: "photo_url",
            kind: ColumnKind::Text { default: None },
        },
        AdditiveColumn {
            name: "available",
            kind: ColumnKind::Bool { default: true },
        },
        AdditiveColumn {
            name: "created_at",
            kind: ColumnKind::Timestamp,
        },
    ],
    reconcile: &[
        Reconcile {
            target: "available",
            chain: &[
                Candidate::Column("available"),
                Candidate::Column("is_active"),
                Candidate::Negated("is_sold_out"),
                Candidate::Exhausted {
                    sold: "qty_sold",
                    limit: "qty_limit",
                },
            ],
            fallback: Fallback::Bool(true),
        },
        Reconcile {
            target: "created_at",
            chain: &[Candidate::Column("created_at")],
            fallback: Fallback::Now,
        },
    ],
    mirrors: &[Mirror {
        legacy: "is_active",
        canonical: "available",
    }],
};

/// Governed tables, migrated in this order.
pub const GOVERNED_TABLES: [&GovernedTable; 2] = [&MENU_WEEKS, &MENU_ITEMS];

// =========================================================================
// SQL rendering
// =========================================================================

impl AdditiveColumn {
    pub fn add_statement(&self, table: &str, dialect: Dialect) -> String {
        let tokens = dialect.tokens();
        let definition = match self.kind {
            ColumnKind::Text { default: None } => "TEXT".to_string(),
            ColumnKind::Text {
                default: Some(value),
            } => format!("TEXT NOT NULL DEFAULT '{value}'"),
            ColumnKind::Bool { default } => {
                format!("BOOLEAN NOT NULL DEFAULT {}", dialect.bool_literal(default))
            }
            ColumnKind::Timestamp => tokens.datetime_type.to_string(),
        };
        format!("ALTER TABLE {table} ADD COLUMN {} {definition}", self.name)
    }
}

impl Candidate {
    fn columns(&self) -> Vec<&'static str> {
        match *self {
            Candidate::Column(c) | Candidate::NonEmpty(c) | Candidate::Negated(c) => vec![c],
            Candidate::Exhausted { sold, limit } => vec![sold, limit],
        }
    }

    fn render(&self, tokens: &SyntaxTokens) -> String {
        match *self {
            Candidate::Column(c) => c.to_string(),
            Candidate::NonEmpty(c) => format!("NULLIF({c}, '')"),
            Candidate::Negated(c) => format!(
                "CASE WHEN {c} = {t} THEN {f} WHEN {c} = {f} THEN {t} END",
                t = tokens.true_literal,
                f = tokens.false_literal,
            ),
            Candidate::Exhausted { sold, limit } => format!(
                "CASE WHEN {limit} IS NOT NULL AND {sold} >= {limit} THEN {} END",
                tokens.false_literal
            ),
        }
    }
}

impl Fallback {
    fn render(&self, tokens: &SyntaxTokens) -> String {
        match *self {
            Fallback::Now => tokens.now.to_string(),
            Fallback::Bool(true) => tokens.true_literal.to_string(),
            Fallback::Bool(false) => tokens.false_literal.to_string(),
            Fallback::Text(s) => format!("'{s}'"),
        }
    }
}

fn coalesce(mut parts: Vec<String>) -> String {
    // SQLite's coalesce() wants two or more arguments
    if parts.len() == 1 {
        return parts.remove(0);
    }
    format!("COALESCE({})", parts.join(", "))
}

/// Backfill expression for one rule.
///
/// Candidates over absent columns are dropped. So are candidates over columns
/// added in this run: those hold only their default, and a legacy value must win.
fn reconcile_expression(
    rule: &Reconcile,
    tokens: &SyntaxTokens,
    present: &BTreeSet<String>,
    fresh: &BTreeSet<String>,
) -> String {
    let mut parts: Vec<String> = rule
        .chain
        .iter()
        .filter(|c| {
            c.columns()
                .iter()
                .all(|col| present.contains(*col) && !fresh.contains(*col))
        })
        .map(|c| c.render(tokens))
        .collect();
    parts.push(rule.fallback.render(tokens));
    coalesce(parts)
}

/// Render the single backfill `UPDATE` for a table, or `None` when no rule applies.
///
/// `present` is every column the table has after this run's additions,
/// `fresh` the subset added by this run.
pub fn backfill_statement(
    table: &GovernedTable,
    dialect: Dialect,
    present: &BTreeSet<String>,
    fresh: &BTreeSet<String>,
) -> Option<String> {
    let tokens = dialect.tokens();
    let mut assignments = Vec::new();

    for rule in table.reconcile {
        if present.contains(rule.target) {
            let expr = reconcile_expression(rule, tokens, present, fresh);
            assignments.push(format!("{} = {expr}", rule.target));
        }
    }

    for mirror in table.mirrors {
        if !present.contains(mirror.legacy) || !present.contains(mirror.canonical) {
            continue;
        }
        // The canonical value wins, so a pair that drifted apart is re-aligned.
        // A single UPDATE only sees old values, so inline the canonical expression.
        let canonical = table
            .reconcile
            .iter()
            .find(|r| r.target == mirror.canonical)
            .map(|r| reconcile_expression(r, tokens, present, fresh))
            .unwrap_or_else(|| mirror.canonical.to_string());
        assignments.push(format!("{} = {canonical}", mirror.legacy));
    }

    if assignments.is_empty() {
        return None;
    }
    Some(format!("UPDATE {} SET {}", table.name, assignments.join(", ")))
}

// =========================================================================
// Execution
// =========================================================================

/// Fatal migration failure; the service must not start.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration of {table} could not open or commit its transaction: {source}")]
    Transaction {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("catalog query for {table} failed: {source}")]
    Introspection {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("backfill of {table} failed: {source}")]
    Backfill {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// An `ADD COLUMN` that failed without aborting the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnWarning {
    pub column: &'static str,
    pub error: String,
}

/// Outcome for one governed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub table: &'static str,
    /// Table absent, nothing done
    pub skipped: bool,
    pub added: Vec<&'static str>,
    pub warnings: Vec<ColumnWarning>,
    pub rows_backfilled: u64,
    /// Legacy mirrors present after migration
    pub mirrors: Vec<Mirror>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub tables: Vec<TableReport>,
}

impl MigrationReport {
    pub fn warnings(&self) -> impl Iterator<Item = (&'static str, &ColumnWarning)> {
        self.tables
            .iter()
            .flat_map(|t| t.warnings.iter().map(move |w| (t.table, w)))
    }

    pub fn mirrors(&self) -> LegacyMirrors {
        LegacyMirrors {
            entries: self
                .tables
                .iter()
                .flat_map(|t| t.mirrors.iter().map(move |m| (t.table, *m)))
                .collect(),
        }
    }
}

/// Legacy columns the write path must keep equal to their canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyMirrors {
    entries: Vec<(&'static str, Mirror)>,
}

impl LegacyMirrors {
    /// Legacy column names duplicating `table.canonical`.
    pub fn legacy_for<'a>(
        &'a self,
        table: &'a str,
        canonical: &'a str,
    ) -> impl Iterator<Item = &'static str> + 'a {
        self.entries
            .iter()
            .filter(move |(t, m)| *t == table && m.canonical == canonical)
            .map(|(_, m)| m.legacy)
    }

    /// Append `(legacy, placeholder)` for every mirrored column in `columns`.
    ///
    /// The legacy column reuses the canonical column's placeholder, so both
    /// receive the same bound value.
    pub fn expand(&self, table: &str, columns: &mut Vec<(&'static str, String)>) {
        let extra: Vec<(&'static str, String)> = columns
            .iter()
            .flat_map(|(col, placeholder)| {
                self.legacy_for(table, col)
                    .map(|legacy| (legacy, placeholder.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        columns.extend(extra);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Migrate one governed table in its own transaction.
pub async fn migrate_table(
    conn: &mut AnyConnection,
    dialect: Dialect,
    table: &GovernedTable,
) -> Result<TableReport, MigrationError> {
    let name = table.name;
    let tx_err = |source| MigrationError::Transaction { table: name, source };
    let introspection_err = |source| MigrationError::Introspection { table: name, source };

    let mut report = TableReport {
        table: name,
        ..Default::default()
    };

    let mut tx = conn.begin().await.map_err(tx_err)?;

    if !introspect::table_exists(&mut tx, dialect, name)
        .await
        .map_err(introspection_err)?
    {
        tracing::debug!(table = name, "Governed table absent, skipping");
        report.skipped = true;
        tx.commit().await.map_err(tx_err)?;
        return Ok(report);
    }

    let existing = introspect::column_names(&mut tx, dialect, name)
        .await
        .map_err(introspection_err)?;

    let mut fresh = BTreeSet::new();
    for column in table.additive {
        if existing.contains(column.name) {
            continue;
        }
        let ddl = column.add_statement(name, dialect);
        let mut savepoint = Connection::begin(&mut *tx).await.map_err(tx_err)?;
        match sqlx::query(&ddl).execute(&mut *savepoint).await {
            Ok(_) => {
                savepoint.commit().await.map_err(tx_err)?;
                tracing::info!(table = name, column = column.name, "Added column");
                fresh.insert(column.name.to_string());
                report.added.push(column.name);
            }
            Err(e) => {
                savepoint.rollback().await.map_err(tx_err)?;
                tracing::warn!(
                    table = name,
                    column = column.name,
                    error = %e,
                    "Could not add column, continuing without it"
                );
                report.warnings.push(ColumnWarning {
                    column: column.name,
                    error: e.to_string(),
                });
            }
        }
    }

    let present: BTreeSet<String> = existing.union(&fresh).cloned().collect();

    if let Some(sql) = backfill_statement(table, dialect, &present, &fresh) {
        let result = sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrationError::Backfill { table: name, source })?;
        report.rows_backfilled = result.rows_affected();
    }

    report.mirrors = table
        .mirrors
        .iter()
        .filter(|m| present.contains(m.legacy) && present.contains(m.canonical))
        .copied()
        .collect();

    tx.commit().await.map_err(tx_err)?;

    tracing::info!(
        table = name,
        added = report.added.len(),
        warnings = report.warnings.len(),
        rows = report.rows_backfilled,
        "Compatibility migration applied"
    );
    Ok(report)
}

/// Migrate every governed table; each table commits independently.
pub async fn migrate(pool: &AnyPool, dialect: Dialect) -> Result<MigrationReport, MigrationError> {
    let mut report = MigrationReport::default();
    for table in GOVERNED_TABLES {
        let mut conn = pool
            .acquire()
            .await
            .map_err(|source| MigrationError::Transaction {
                table: table.name,
                source,
            })?;
        report.tables.push(migrate_table(&mut conn, dialect, table).await?);
    }
    Ok(report)
}
