//! # canteen-core: Pure Business Logic for the Canteen POS
//!
//! Domain types, integer money, eligibility predicates and the error
//! taxonomy. Nothing in here touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               API layer (external, authenticated)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ actor_id + validated input             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    canteen-engine                               │   │
//! │  │    create_sale, cancel_sale, restock_product, adjust_balance    │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────┐  ┌────────▼──────────────────┐    │
//! │  │   ★ canteen-core (THIS CRATE) ★ │  │   canteen-db (SQLite)     │    │
//! │  │  types • money • eligibility    │  │  repositories, ledger,    │    │
//! │  │  pricing • validation • errors  │  │  reports, migrations      │    │
//! │  │  NO I/O • PURE FUNCTIONS        │  │                           │    │
//! │  └─────────────────────────────────┘  └───────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Customer, Sale, SaleLine, LedgerEntry, Restock
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`eligibility`] - `can_fulfill` / `can_spend`
//! - [`pricing`] - exact line and sale totals
//! - [`validation`] - input shape rules
//! - [`report`] - dashboard aggregates
//! - [`error`] - CoreError, ValidationError, ErrorKind
//!
//! ## Example Usage
//!
//! ```rust
//! use canteen_core::money::Money;
//!
//! let soda: Money = "5.00".parse().unwrap();
//! let total = soda.checked_mul_quantity(2).unwrap();
//! assert_eq!(total.to_string(), "10.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod eligibility;
pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::{PricedLine, SaleQuote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default reorder threshold for new products.
pub const DEFAULT_REORDER_THRESHOLD: i64 = 10;
