//! # Domain Types
//!
//! Core domain types used throughout the canteen POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │   LedgerEntry   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name (unique)  │   │  handle(unique) │   │  customer_id    │       │
//! │  │  unit_price     │   │  category       │   │  amount+dir     │       │
//! │  │  stock >= 0     │   │  balance        │   │  reason, actor  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │──►│    SaleLine     │   │    Restock      │       │
//! │  │  ─────────────  │1:n│  ─────────────  │   │  ─────────────  │       │
//! │  │  status         │   │  qty × price    │   │  product_id     │       │
//! │  │  total          │   │  name snapshot  │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock and balance are absent from the update structs: they change only
//! through sales, cancellations, restocks and balance adjustments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Customer category. Staff may carry a negative balance indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerCategory {
    Standard,
    Staff,
}

impl CustomerCategory {
    #[inline]
    pub const fn may_go_negative(&self) -> bool {
        matches!(self, CustomerCategory::Staff)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            CustomerCategory::Standard => "standard",
            CustomerCategory::Staff => "staff",
        }
    }
}

impl Default for CustomerCategory {
    fn default() -> Self {
        CustomerCategory::Standard
    }
}

/// Sale lifecycle: `Active --cancel--> Cancelled`. Cancelled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Active,
    Cancelled,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

/// Which way a ledger entry moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDirection {
    /// Takes money off the balance.
    Debit,
    /// Puts money on the balance.
    Credit,
}

impl LedgerDirection {
    /// Applies the direction to a positive magnitude.
    #[inline]
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            LedgerDirection::Credit => amount,
            LedgerDirection::Debit => -amount,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LedgerDirection::Debit => "debit",
            LedgerDirection::Credit => "credit",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the canteen shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique ignoring case.
    pub name: String,

    /// Catalog price in cents, always positive.
    pub unit_price_cents: i64,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Stock level at or below which the product counts as low.
    pub reorder_threshold: i64,

    /// Inactive products cannot be sold.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_threshold
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A prepaid canteen account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Short unique nickname used at the till, unique ignoring case.
    pub handle: String,
    /// Where the customer is lodged, if anywhere.
    pub room: Option<String>,
    pub category: CustomerCategory,
    pub balance_cents: i64,
    /// Opening balance; the base the ledger reconciles against.
    pub initial_balance_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    #[inline]
    pub fn initial_balance(&self) -> Money {
        Money::from_cents(self.initial_balance_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale and its lines. Created whole; only `status` and the cancellation
/// fields ever change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    /// Who rang the sale up.
    pub actor_id: String,
    /// Always Σ line totals.
    pub total_cents: i64,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub lines: Vec<SaleLine>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status == SaleStatus::Cancelled
    }
}

/// One product/quantity/price row of a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// Position within the sale, starting at 0.
    pub line_no: i64,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub total_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Immutable record of a balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub customer_id: String,
    /// Magnitude in cents, always positive.
    pub amount_cents: i64,
    pub direction: LedgerDirection,
    pub reason: String,
    pub actor_id: String,
    /// Set for sale debits and their cancellation credits.
    pub sale_id: Option<String>,
    /// Customer balance right after this entry was applied.
    pub balance_after_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// `+amount` for credits, `-amount` for debits.
    #[inline]
    pub fn signed_amount(&self) -> Money {
        self.direction.signed(self.amount())
    }

    #[inline]
    pub fn balance_after(&self) -> Money {
        Money::from_cents(self.balance_after_cents)
    }
}

/// Audit record of stock added to a product. Not a balance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Restock {
    pub id: String,
    pub product_id: String,
    pub actor_id: String,
    pub quantity: i64,
    pub stock_after: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    /// Falls back to the configured default when absent.
    pub reorder_threshold: Option<i64>,
}

/// Fields for a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub handle: String,
    pub room: Option<String>,
    #[serde(default)]
    pub category: CustomerCategory,
    #[serde(default)]
    pub initial_balance_cents: i64,
}

/// Partial product update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub reorder_threshold: Option<i64>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit_price_cents.is_none()
            && self.reorder_threshold.is_none()
            && self.is_active.is_none()
    }
}

/// Partial customer update. `room: Some(None)` clears the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub room: Option<Option<String>>,
    pub category: Option<CustomerCategory>,
    pub is_active: Option<bool>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.handle.is_none()
            && self.room.is_none()
            && self.category.is_none()
            && self.is_active.is_none()
    }
}

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the catalog price when present; must be positive.
    pub unit_price_cents: Option<i64>,
}

impl SaleLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
        }
    }

    pub fn with_unit_price(mut self, price: Money) -> Self {
        self.unit_price_cents = Some(price.cents());
        self
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Product listing filter. Results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
    /// Only products at or below their reorder threshold.
    #[serde(default)]
    pub low_stock_only: bool,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Customer listing filter. Results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerFilter {
    /// Case-insensitive substring of name or handle.
    pub search: Option<String>,
    pub category: Option<CustomerCategory>,
    #[serde(default)]
    pub active_only: bool,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Sale listing filter. Results are newest first. Dates are UTC days,
/// both ends inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleFilter {
    pub customer_id: Option<String>,
    pub actor_id: Option<String>,
    pub status: Option<SaleStatus>,
    #[ts(as = "Option<String>")]
    pub date_from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub date_to: Option<NaiveDate>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// What happened to a retired product or customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Retirement {
    /// No history referenced the row, so it was removed.
    Deleted,
    /// History exists; the row was kept and marked inactive.
    Deactivated,
}

// =============================================================================
// Unit Tests
// =============================================================================
