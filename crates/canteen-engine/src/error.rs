//! # Engine Error Type
//!
//! What callers of the engine see when an operation fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError (rules)  ───────────────────────────► EngineError::Rule      │
//! │                                                                         │
//! │  DbError::UniqueViolation(products.name)  ─────► Rule(DuplicateName)    │
//! │  DbError::UniqueViolation(customers.handle) ───► Rule(DuplicateHandle)  │
//! │  DbError::{Busy, PoolExhausted, CheckViolation} ► Conflict  (retry)     │
//! │  any other DbError  ───────────────────────────► Storage                │
//! │                                                                         │
//! │  Every failure drops the open transaction, so nothing is half-applied. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use canteen_core::{CoreError, ErrorKind, ValidationError};
use canteen_db::DbError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule, precondition or lookup failed. Not retryable.
    #[error(transparent)]
    Rule(#[from] CoreError),

    /// Lost a race with another writer. The whole operation may be run
    /// again from validation.
    #[error("Conflicting concurrent update, retry: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(DbError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Rule(e) => e.kind(),
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// True when the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// The rule violation, if that is what this is.
    pub fn rule(&self) -> Option<&CoreError> {
        match self {
            EngineError::Rule(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } if field == "products.name" => {
                EngineError::Rule(CoreError::DuplicateName(value))
            }
            DbError::UniqueViolation { field, value } if field == "customers.handle" => {
                EngineError::Rule(CoreError::DuplicateHandle(value))
            }
            e if e.is_retryable() => EngineError::Conflict(e.to_string()),
            e => EngineError::Storage(e),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Rule(CoreError::Validation(err))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use canteen_core::Money;

    #[test]
    fn test_unique_violations_become_integrity_errors() {
        let err: EngineError = DbError::duplicate("products.name", "Soda").into();
        assert!(matches!(err.rule(), Some(CoreError::DuplicateName(n)) if n == "Soda"));
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let err: EngineError = DbError::duplicate("customers.handle", "alice").into();
        assert!(matches!(err.rule(), Some(CoreError::DuplicateHandle(_))));
    }

    #[test]
    fn test_contention_is_retryable() {
        let err: EngineError = DbError::Busy("database is locked".into()).into();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert!(err.is_retryable());
        assert_eq!(err.kind().http_status(), 503);

        let err: EngineError = DbError::CheckViolation {
            constraint: "product_stock_floor".into(),
        }
        .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_storage_errors_are_internal() {
        let err: EngineError = DbError::Query("boom".into()).into();
        assert!(matches!(err, EngineError::Storage(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rule_errors_keep_their_kind() {
        let err = EngineError::from(CoreError::InsufficientBalance {
            available: Money::from_cents(1000),
            required: Money::from_cents(1500),
        });
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available 10.00, required 15.00"
        );
    }
}
