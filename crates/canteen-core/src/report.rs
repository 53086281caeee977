//! # Report Types
//!
//! Read-only aggregates for dashboards. Derived from sales and ledger rows,
//! never authoritative. Cancelled sales are left out of every revenue
//! figure and days are UTC calendar days.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CustomerCategory;

/// Sales of one product over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub quantity_sold: i64,
    /// Number of sale lines, not distinct sales.
    pub line_count: i64,
    pub revenue_cents: i64,
}

/// Totals for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub average_ticket_cents: i64,
    pub top_products: Vec<ProductSales>,
}

/// Totals over an inclusive date range with the per-day breakdown.
/// Days without sales are omitted from `days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodSummary {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub average_ticket_cents: i64,
    pub days: Vec<DayTotal>,
}

/// Spending of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerSpend {
    pub customer_id: String,
    pub name: String,
    pub handle: String,
    pub sale_count: i64,
    pub total_spent_cents: i64,
}

/// Sales rung up by one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SellerSales {
    pub actor_id: String,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub active_customers: i64,
    pub standard_customers: i64,
    pub staff_customers: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub today_sale_count: i64,
    pub today_revenue_cents: i64,
    pub negative_balance_customers: i64,
    /// Σ balance over active customers.
    pub total_balance_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub total_balance_cents: i64,
    /// Σ of positive balances (prepaid money held).
    pub positive_balance_cents: i64,
    /// Σ of negative balances (money owed), as a negative number.
    pub negative_balance_cents: i64,
    pub total_revenue_cents: i64,
    pub today_revenue_cents: i64,
    pub month_revenue_cents: i64,
    pub cancelled_sale_count: i64,
}

impl FinancialSummary {
    pub fn total_balance(&self) -> Money {
        Money::from_cents(self.total_balance_cents)
    }
}

/// Purchase history summary for a single customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSalesSummary {
    pub customer_id: String,
    pub sale_count: i64,
    pub total_spent_cents: i64,
    pub average_ticket_cents: i64,
    #[ts(as = "Option<String>")]
    pub last_sale_at: Option<DateTime<Utc>>,
    pub balance_cents: i64,
}

/// Active customers per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryCount {
    pub category: CustomerCategory,
    pub customer_count: i64,
    pub total_balance_cents: i64,
}

/// Lifetime sales of one product next to its current stock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSalesStats {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub stock: i64,
    pub reorder_threshold: i64,
    pub is_active: bool,
    /// Number of sale lines, not distinct sales.
    pub line_count: i64,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// Catalog size and the value of what is on the shelves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogSummary {
    pub total_products: i64,
    pub active_products: i64,
    pub inactive_products: i64,
    /// Active products at or below their reorder threshold.
    pub low_stock_products: i64,
    /// Σ unit price × stock over every product, active or not.
    pub stock_value_cents: i64,
}

impl CatalogSummary {
    pub fn stock_value(&self) -> Money {
        Money::from_cents(self.stock_value_cents)
    }
}
