//! # Storage Errors
//!
//! `DbError` is what every repository returns. It sorts SQLite failures into
//! the handful of cases the engine reacts to differently.
//!
//! ## Where Each Case Ends Up
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                                                           │
//! │       │  classify()                                                    │
//! │       ▼                                                                 │
//! │  DbError                              EngineError (canteen-engine)     │
//! │    UniqueViolation(products.name)  ──► Rule(DuplicateName)             │
//! │    UniqueViolation(customers.handle) ► Rule(DuplicateHandle)           │
//! │    Busy / PoolExhausted / Check    ──► Conflict (caller may retry)     │
//! │    Immutable                       ──► Storage (a bug, never expected) │
//! │    everything else                 ──► Storage                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} '{id}' does not exist")]
    NotFound { entity: String, id: String },

    /// `field` is `table.column` as SQLite reports it, e.g. `products.name`.
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    #[error("Referenced row missing: {message}")]
    ForeignKeyViolation { message: String },

    /// A named schema CHECK fired, e.g. `product_stock_floor`.
    ///
    /// Guarded updates make this unreachable in normal operation; seeing it
    /// means a write raced past a floor and the operation can be retried.
    #[error("Constraint {constraint} rejected the write")]
    CheckViolation { constraint: String },

    /// A trigger refused to modify an append-only row (ledger entries).
    #[error("Refused to modify append-only row: {0}")]
    Immutable(String),

    /// Another writer held the lock for longer than the busy timeout.
    #[error("Store busy: {0}")]
    Busy(String),

    #[error("Cannot open store: {0}")]
    Connection(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Statement failed: {0}")]
    Query(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Every pooled connection stayed checked out past the acquire timeout.
    #[error("No free connection in the pool")]
    PoolExhausted,

    #[error("Unexpected storage failure: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when running the whole operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Busy(_) | DbError::PoolExhausted | DbError::CheckViolation { .. }
        )
    }
}

/// SQLite primary result codes for lock contention.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

fn is_lock_contention(code: Option<&str>, msg: &str) -> bool {
    // extended codes (517 BUSY_SNAPSHOT, 262 LOCKED_SHAREDCACHE) keep the
    // primary code in the low byte
    let primary = code.and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff);

    matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
        || msg.contains("database is locked")
        || msg.contains("database table is locked")
}

/// Sorts a SQLite error message into a variant.
///
/// ```text
/// "UNIQUE constraint failed: customers.handle"  → UniqueViolation
/// "FOREIGN KEY constraint failed"               → ForeignKeyViolation
/// "CHECK constraint failed: product_stock_floor"→ CheckViolation
/// "ledger entries are immutable"                → Immutable
/// code 5/6 or "database is locked"              → Busy
/// ```
fn classify(code: Option<&str>, msg: &str) -> DbError {
    if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
        DbError::duplicate(field, "")
    } else if msg.contains("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: msg.to_string(),
        }
    } else if let Some(constraint) = msg.strip_prefix("CHECK constraint failed: ") {
        DbError::CheckViolation {
            constraint: constraint.to_string(),
        }
    } else if msg.contains("immutable") {
        DbError::Immutable(msg.to_string())
    } else if is_lock_contention(code, msg) {
        DbError::Busy(msg.to_string())
    } else {
        DbError::Query(msg.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => classify(db_err.code().as_deref(), db_err.message()),
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::Connection("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
