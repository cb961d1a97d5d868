//! SQL dialect tokens
//!
//! The service runs against an embedded SQLite file or a PostgreSQL server
//! through the same `AnyPool`. Everything that differs in DDL or literal
//! syntax lives in [`SyntaxTokens`]; queries ask the dialect for a token
//! instead of branching on the engine.

use thiserror::Error;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// Literal syntax for one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxTokens {
    /// Column type for timestamps
    pub datetime_type: &'static str,
    pub true_literal: &'static str,
    pub false_literal: &'static str,
    /// Current-timestamp expression (also legal as a column default)
    pub now: &'static str,
    /// Auto-increment primary key column definition
    pub id_column: &'static str,
    /// Type a text parameter is cast to when bound to a timestamp column, if any
    pub timestamp_param_cast: Option<&'static str>,
    /// Suffix for `DROP TABLE` so dependent constraints go too
    pub drop_suffix: &'static str,
}

const SQLITE_TOKENS: SyntaxTokens = SyntaxTokens {
    datetime_type: "DATETIME",
    true_literal: "1",
    false_literal: "0",
    now: "CURRENT_TIMESTAMP",
    id_column: "INTEGER PRIMARY KEY AUTOINCREMENT",
    timestamp_param_cast: None,
    drop_suffix: "",
};

const POSTGRES_TOKENS: SyntaxTokens = SyntaxTokens {
    datetime_type: "TIMESTAMP",
    true_literal: "TRUE",
    false_literal: "FALSE",
    now: "CURRENT_TIMESTAMP",
    id_column: "BIGSERIAL PRIMARY KEY",
    timestamp_param_cast: Some("TIMESTAMP"),
    drop_suffix: " CASCADE",
};

/// The connection reported an engine this service has no tokens for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported database engine: {0}")]
pub struct UnsupportedDialect(pub String);

impl Dialect {
    /// Map the engine name reported by a live connection (`AnyConnection::backend_name`).
    ///
    /// Prefix match, case-insensitive: `PostgreSQL`, `postgres` and friends map to
    /// [`Dialect::Postgres`]; `SQLite` maps to [`Dialect::Sqlite`]. Anything else is an error.
    pub fn detect(engine: &str) -> Result<Self, UnsupportedDialect> {
        let name = engine.trim().to_ascii_lowercase();
        if name.starts_with("postgres") {
            Ok(Self::Postgres)
        } else if name.starts_with("sqlite") {
            Ok(Self::Sqlite)
        } else {
            Err(UnsupportedDialect(engine.to_string()))
        }
    }

    pub fn tokens(&self) -> &'static SyntaxTokens {
        match self {
            Self::Sqlite => &SQLITE_TOKENS,
            Self::Postgres => &POSTGRES_TOKENS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    pub fn bool_literal(&self, value: bool) -> &'static str {
        let tokens = self.tokens();
        if value {
            tokens.true_literal
        } else {
            tokens.false_literal
        }
    }

    /// Placeholder for the `n`-th parameter when it carries a timestamp string.
    pub fn timestamp_param(&self, n: usize) -> String {
        match self.tokens().timestamp_param_cast {
            Some(ty) => format!("CAST(${n} AS {ty})"),
            None => format!("${n}"),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
