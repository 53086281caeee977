//! # Error Types
//!
//! Domain-specific error types for canteen-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  canteen-core errors (this file)                                       │
//! │  ├── CoreError        - Caller-visible business failures               │
//! │  ├── ValidationError  - Input shape failures                           │
//! │  └── ErrorKind        - Stable classification the caller branches on   │
//! │                                                                         │
//! │  canteen-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures (locks, constraints, I/O)     │
//! │                                                                         │
//! │  canteen-engine errors                                                 │
//! │  └── EngineError      - Rule | Conflict (retry) | Storage              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kinds
//! | Kind           | Variants                                              | Status |
//! |----------------|-------------------------------------------------------|--------|
//! | `NotFound`     | CustomerNotFound, ProductNotFound, SaleNotFound       | 404    |
//! | `Precondition` | CustomerInactive, ProductInactive, SaleAlreadyCancelled, InvalidQuantity, ... | 400 |
//! | `BusinessRule` | InsufficientStock, InsufficientBalance, CategoryChangeBlocked | 422 |
//! | `Integrity`    | DuplicateName, DuplicateHandle                        | 409    |
//! | `Conflict`     | lost a race on the store, safe to retry               | 503    |

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business failures returned by catalog and sale operations.
///
/// Every variant is detected before any mutation is attempted, except when
/// the atomic apply re-validates under the write lock and finds that a
/// concurrent writer got there first; that path reports the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Customer {0} is inactive")]
    CustomerInactive(String),

    #[error("Product {0} is inactive")]
    ProductInactive(String),

    /// Cancellation is terminal; a sale is never cancelled twice.
    #[error("Sale {0} is already cancelled")]
    SaleAlreadyCancelled(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Amount is zero, negative, or would overflow when multiplied or summed.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("A sale needs at least one line")]
    EmptySale,

    #[error("A sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// A customer carrying a negative balance cannot be moved to Standard.
    #[error("Customer {customer_id} has balance {balance}; settle it before changing category")]
    CategoryChangeBlocked { customer_id: String, balance: Money },

    /// Insufficient stock to complete a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: 6 × soda
    ///      │
    ///      ▼
    /// Check stock: available=4
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 4, requested: 6 }
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },

    #[error("Product name '{0}' already exists")]
    DuplicateName(String),

    #[error("Customer handle '{0}' already exists")]
    DuplicateHandle(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for callers that branch on status.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::CustomerNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_) => ErrorKind::NotFound,

            CoreError::CustomerInactive(_)
            | CoreError::ProductInactive(_)
            | CoreError::SaleAlreadyCancelled(_)
            | CoreError::InvalidQuantity(_)
            | CoreError::InvalidAmount { .. }
            | CoreError::EmptySale
            | CoreError::TooManyLines { .. }
            | CoreError::Validation(_) => ErrorKind::Precondition,

            CoreError::InsufficientStock { .. }
            | CoreError::InsufficientBalance { .. }
            | CoreError::CategoryChangeBlocked { .. } => ErrorKind::BusinessRule,

            CoreError::DuplicateName(_) | CoreError::DuplicateHandle(_) => ErrorKind::Integrity,
        }
    }

    pub(crate) fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Stable classification of every caller-visible failure.
///
/// Serialized as SCREAMING_SNAKE_CASE so API layers can forward it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 404-class
    NotFound,
    /// 400-class
    Precondition,
    /// 422-class
    BusinessRule,
    /// 409-class
    Integrity,
    /// 503-class, the whole operation may be retried from validation
    Conflict,
    /// 500-class
    Internal,
}

impl ErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Precondition => "PRECONDITION_FAILED",
            ErrorKind::BusinessRule => "BUSINESS_RULE",
            ErrorKind::Integrity => "INTEGRITY",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Precondition => 400,
            ErrorKind::BusinessRule => 422,
            ErrorKind::Integrity => 409,
            ErrorKind::Conflict => 503,
            ErrorKind::Internal => 500,
        }
    }

    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A field failed its shape check before any lookup ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace only.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must lie within {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// E.g. a handle with spaces, or an amount with three decimals.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
