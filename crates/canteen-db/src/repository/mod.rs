//! # Repository Module
//!
//! Database repository implementations for the canteen store.
//!
//! ## Two Kinds of Methods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Reads and catalog writes          Atomic-batch writes                  │
//! │  ─────────────────────────         ─────────────────────────────        │
//! │  &self, run on the pool            associated fns taking                │
//! │                                    `conn: &mut SqliteConnection`,       │
//! │  db.products().get_by_id(id)       called with `&mut *tx`               │
//! │  db.reports().daily_summary(d)                                          │
//! │                                    ProductRepository::deduct_stock(     │
//! │                                        &mut *tx, id, qty)               │
//! │                                                                         │
//! │  Stock and balance only move through the right-hand column, and only   │
//! │  the sale engine calls it.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - catalog and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - accounts and balance
//! - [`SaleRepository`](sale::SaleRepository) - sales and their lines
//! - [`LedgerRepository`](ledger::LedgerRepository) - append-only balance log
//! - [`RestockRepository`](restock::RestockRepository) - stock audit trail
//! - [`ReportRepository`](report::ReportRepository) - dashboard aggregates

pub mod customer;
pub mod ledger;
pub mod product;
pub mod report;
pub mod restock;
pub mod sale;

/// Builds a `LIKE ... ESCAPE '\'` pattern matching `term` anywhere.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// SQLite reads a negative LIMIT as "no limit".
pub(crate) fn page(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (offset.unwrap_or(0).max(0), limit.filter(|l| *l >= 0).unwrap_or(-1))
}

/// Fresh UUID v4 for a new row.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
