//! # Ledger
//!
//! Read side of the balance ledger: history and reconciliation.
//!
//! Entries are only ever appended by [`SaleEngine`](crate::SaleEngine),
//! inside the same transaction as the balance change they record.
//!
//! ## Reconciliation
//! ```text
//! expected = initial_balance + Σ credits − Σ debits
//! balanced = expected == current balance
//! ```
//! The customer row and the sums are read in one transaction, so a sale
//! committing in between cannot make a healthy account look unbalanced.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::EngineResult;
use canteen_core::{CoreError, LedgerEntry, Money};
use canteen_db::{CustomerRepository, Database, LedgerRepository};

/// Outcome of checking one customer's balance against their ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub customer_id: String,
    pub initial: Money,
    pub credits: Money,
    pub debits: Money,
    pub expected: Money,
    pub actual: Money,
    pub entry_count: i64,
    pub balanced: bool,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    pub fn new(db: Database) -> Self {
        Ledger { db }
    }

    /// Entries for a customer, newest first.
    pub async fn history_for(&self, customer_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        if self.db.customers().get_by_id(customer_id).await?.is_none() {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }
        Ok(self.db.ledger().history_for(customer_id).await?)
    }

    /// The sale's debit, followed by its credit if it was cancelled.
    pub async fn entries_for_sale(&self, sale_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        if self.db.sales().get_by_id(sale_id).await?.is_none() {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }
        Ok(self.db.ledger().entries_for_sale(sale_id).await?)
    }

    pub async fn reconcile(&self, customer_id: &str) -> EngineResult<Reconciliation> {
        let mut tx = self.db.begin().await?;

        let customer = CustomerRepository::fetch(&mut *tx, customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;
        let totals = LedgerRepository::totals(&mut *tx, customer_id).await?;

        tx.commit().await?;

        let initial = customer.initial_balance();
        let credits = Money::from_cents(totals.credits_cents);
        let debits = Money::from_cents(totals.debits_cents);
        let expected = initial + credits - debits;
        let actual = customer.balance();

        if expected != actual {
            tracing::error!(
                customer_id = %customer_id,
                expected = %expected,
                actual = %actual,
                "Ledger does not reconcile"
            );
        }

        Ok(Reconciliation {
            customer_id: customer.id,
            initial,
            credits,
            debits,
            expected,
            actual,
            entry_count: totals.entry_count,
            balanced: expected == actual,
        })
    }
}
