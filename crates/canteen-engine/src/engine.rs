//! # Sale Transaction Engine
//!
//! The four operations that move stock or balance. Each one is a single
//! atomic batch: it commits whole or leaves nothing behind.
//!
//! ## Shape of Every Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Validate          committed snapshot, no transaction               │
//! │     shape, lookups,   ─► first failing rule is returned as-is          │
//! │     eligibility                                                        │
//! │                                                                         │
//! │  2. Apply             BEGIN; first statement is a conditional UPDATE   │
//! │                       so SQLite's write lock is taken up front         │
//! │                                                                         │
//! │       UPDATE products  SET stock = stock - q                            │
//! │         WHERE id = ? AND is_active AND stock >= q   RETURNING stock    │
//! │       UPDATE customers SET balance = balance - t                        │
//! │         WHERE id = ? AND is_active                                      │
//! │           AND (staff OR balance >= t)               RETURNING balance  │
//! │       INSERT sale, lines, ledger entry                                 │
//! │                                                                         │
//! │     A guard that matches no row means someone else got there first:   │
//! │     re-read the row under the lock, return the same rule error step   │
//! │     1 would have, and drop the transaction (rollback).                 │
//! │                                                                         │
//! │  3. COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two sales of the last units of a product serialize on the write lock;
//! the loser's guard misses and it fails with `InsufficientStock`.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use canteen_core::eligibility::{check_fulfill, check_spend};
use canteen_core::pricing::price_line;
use canteen_core::validation::{validate_actor_id, validate_quantity, validate_reason};
use canteen_core::{
    CoreError, Customer, LedgerDirection, LedgerEntry, Money, Product, Restock, Sale, SaleLine,
    SaleLineRequest, SaleQuote, SaleStatus,
};
use canteen_db::{
    generate_id, CustomerRepository, Database, LedgerRepository, ProductRepository,
    RestockRepository, SaleRepository,
};

/// Runs sales, cancellations, restocks and balance adjustments.
///
/// Cheap to clone; clones share the database pool. Safe to call from many
/// tasks at once.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    db: Database,
    config: EngineConfig,
}

impl SaleEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        SaleEngine { db, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // CreateSale
    // =========================================================================

    /// Sells `lines` to a customer.
    ///
    /// ## Errors (first one found wins)
    /// - `EmptySale`, `InvalidQuantity`
    /// - `TooManyLines`, `Validation` only when the config sets those limits
    /// - `CustomerNotFound`, `CustomerInactive`
    /// - `ProductNotFound`, `ProductInactive` (line order)
    /// - `InvalidAmount` for a non-positive explicit price or overflow
    /// - `InsufficientStock` for the first short product, quantities of
    ///   repeated products summed
    /// - `InsufficientBalance`
    /// - `Conflict` if the store stayed locked past the busy timeout
    pub async fn create_sale(
        &self,
        customer_id: &str,
        actor_id: &str,
        lines: &[SaleLineRequest],
    ) -> EngineResult<Sale> {
        debug!(customer_id = %customer_id, actor_id = %actor_id, lines = lines.len(), "create_sale");
        let result = self.try_create_sale(customer_id, actor_id, lines).await;
        log_rejection("create_sale", &result);
        result
    }

    async fn try_create_sale(
        &self,
        customer_id: &str,
        actor_id: &str,
        lines: &[SaleLineRequest],
    ) -> EngineResult<Sale> {
        validate_actor_id(actor_id)?;
        self.check_line_shapes(lines)?;

        let customer = self.load_customer(customer_id).await?;
        if !customer.is_active {
            return Err(CoreError::CustomerInactive(customer.id).into());
        }

        // One snapshot per distinct product, reused for repeated lines.
        let mut products: HashMap<String, Product> = HashMap::new();
        let mut quote = SaleQuote::default();
        for request in lines {
            if !products.contains_key(&request.product_id) {
                let product = self.load_product(&request.product_id).await?;
                products.insert(product.id.clone(), product);
            }
            let product = &products[&request.product_id];
            if !product.is_active {
                return Err(CoreError::ProductInactive(product.id.clone()).into());
            }
            quote.push(price_line(product, request)?)?;
        }

        for (product_id, qty) in quote.quantities_by_product() {
            check_fulfill(&products[product_id], qty)?;
        }
        check_spend(&customer, quote.total)?;

        // ---------------------------------------------------------------------
        // Atomic apply
        // ---------------------------------------------------------------------
        let mut tx = self.db.begin().await?;

        for (product_id, qty) in quote.quantities_by_product() {
            if ProductRepository::deduct_stock(&mut *tx, product_id, qty)
                .await?
                .is_none()
            {
                return Err(explain_stock_miss(&mut *tx, product_id, qty).await);
            }
        }

        let Some(balance_after) =
            CustomerRepository::charge(&mut *tx, &customer.id, quote.total.cents()).await?
        else {
            return Err(explain_charge_miss(&mut *tx, &customer.id, quote.total).await);
        };

        let now = Utc::now();
        let sale_id = generate_id();
        let sale = Sale {
            id: sale_id.clone(),
            customer_id: customer.id.clone(),
            actor_id: actor_id.to_string(),
            total_cents: quote.total.cents(),
            status: SaleStatus::Active,
            created_at: now,
            cancelled_at: None,
            cancelled_by: None,
            lines: quote
                .lines
                .iter()
                .enumerate()
                .map(|(i, line)| SaleLine {
                    id: generate_id(),
                    sale_id: sale_id.clone(),
                    line_no: i as i64,
                    product_id: line.product_id.clone(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    total_cents: line.total.cents(),
                })
                .collect(),
        };
        SaleRepository::insert(&mut *tx, &sale).await?;

        LedgerRepository::append(
            &mut *tx,
            &LedgerEntry {
                id: generate_id(),
                customer_id: customer.id.clone(),
                amount_cents: sale.total_cents,
                direction: LedgerDirection::Debit,
                reason: format!("Sale {sale_id}"),
                actor_id: actor_id.to_string(),
                sale_id: Some(sale_id.clone()),
                balance_after_cents: balance_after,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            customer_id = %sale.customer_id,
            total_cents = sale.total_cents,
            lines = sale.lines.len(),
            balance_after_cents = balance_after,
            "Sale committed"
        );
        Ok(sale)
    }

    fn check_line_shapes(&self, lines: &[SaleLineRequest]) -> EngineResult<()> {
        if lines.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        if let Some(max) = self.config.max_sale_lines {
            if lines.len() > max {
                return Err(CoreError::TooManyLines { max }.into());
            }
        }
        for line in lines {
            if line.quantity <= 0 {
                return Err(CoreError::InvalidQuantity(line.quantity).into());
            }
            if let Some(max) = self.config.max_line_quantity {
                validate_quantity(line.quantity, max)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // CancelSale
    // =========================================================================

    /// Cancels an active sale: stock goes back to every product, the total
    /// goes back to the customer, and a credit entry is appended.
    ///
    /// No eligibility checks run here; giving resources back never breaks a
    /// floor, so it works for deactivated products and customers too.
    pub async fn cancel_sale(&self, sale_id: &str, actor_id: &str) -> EngineResult<Sale> {
        debug!(sale_id = %sale_id, actor_id = %actor_id, "cancel_sale");
        let result = self.try_cancel_sale(sale_id, actor_id).await;
        log_rejection("cancel_sale", &result);
        result
    }

    async fn try_cancel_sale(&self, sale_id: &str, actor_id: &str) -> EngineResult<Sale> {
        validate_actor_id(actor_id)?;

        let existing = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        if existing.is_cancelled() {
            return Err(CoreError::SaleAlreadyCancelled(sale_id.to_string()).into());
        }

        let mut tx = self.db.begin().await?;
        let now = Utc::now();

        // Only an active sale matches, so a concurrent cancel loses here.
        let Some(mut sale) = SaleRepository::mark_cancelled(&mut *tx, sale_id, actor_id, now).await?
        else {
            let err = match SaleRepository::fetch(&mut *tx, sale_id).await? {
                Some(_) => CoreError::SaleAlreadyCancelled(sale_id.to_string()),
                None => CoreError::SaleNotFound(sale_id.to_string()),
            };
            return Err(err.into());
        };
        sale.lines = SaleRepository::lines(&mut *tx, sale_id).await?;

        for line in &sale.lines {
            if ProductRepository::add_stock(&mut *tx, &line.product_id, line.quantity)
                .await?
                .is_none()
            {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }
        }

        // Refund what was actually debited.
        let refund_cents = LedgerRepository::sale_debit(&mut *tx, sale_id)
            .await?
            .map(|debit| debit.amount_cents)
            .unwrap_or(sale.total_cents);

        let Some(balance_after) =
            CustomerRepository::credit(&mut *tx, &sale.customer_id, refund_cents).await?
        else {
            return Err(CoreError::CustomerNotFound(sale.customer_id.clone()).into());
        };

        LedgerRepository::append(
            &mut *tx,
            &LedgerEntry {
                id: generate_id(),
                customer_id: sale.customer_id.clone(),
                amount_cents: refund_cents,
                direction: LedgerDirection::Credit,
                reason: format!("Cancellation of sale {sale_id}"),
                actor_id: actor_id.to_string(),
                sale_id: Some(sale_id.to_string()),
                balance_after_cents: balance_after,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            customer_id = %sale.customer_id,
            refund_cents,
            balance_after_cents = balance_after,
            "Sale cancelled"
        );
        Ok(sale)
    }

    // =========================================================================
    // RestockProduct
    // =========================================================================

    /// Adds stock and records who did it. Inactive products may be
    /// restocked.
    pub async fn restock_product(
        &self,
        product_id: &str,
        actor_id: &str,
        quantity: i64,
    ) -> EngineResult<Product> {
        debug!(product_id = %product_id, actor_id = %actor_id, quantity, "restock_product");
        let result = self.try_restock(product_id, actor_id, quantity).await;
        log_rejection("restock_product", &result);
        result
    }

    async fn try_restock(
        &self,
        product_id: &str,
        actor_id: &str,
        quantity: i64,
    ) -> EngineResult<Product> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity).into());
        }
        validate_actor_id(actor_id)?;
        self.load_product(product_id).await?;

        let mut tx = self.db.begin().await?;

        let Some(stock_after) = ProductRepository::add_stock(&mut *tx, product_id, quantity).await?
        else {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        };

        RestockRepository::insert(
            &mut *tx,
            &Restock {
                id: generate_id(),
                product_id: product_id.to_string(),
                actor_id: actor_id.to_string(),
                quantity,
                stock_after,
                created_at: Utc::now(),
            },
        )
        .await?;

        let product = ProductRepository::fetch(&mut *tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        tx.commit().await?;

        info!(product_id = %product_id, quantity, stock_after, "Product restocked");
        Ok(product)
    }

    // =========================================================================
    // AdjustBalance
    // =========================================================================

    /// Manually credits or debits a customer.
    ///
    /// A debit must pass the spending rule, so the customer has to be
    /// active. A credit goes through for deactivated customers too, which is
    /// how a retired account's outstanding debt gets settled. A blank
    /// `reason` is recorded as "Balance top-up" or "Manual debit".
    pub async fn adjust_balance(
        &self,
        customer_id: &str,
        actor_id: &str,
        amount: Money,
        direction: LedgerDirection,
        reason: &str,
    ) -> EngineResult<LedgerEntry> {
        debug!(
            customer_id = %customer_id,
            actor_id = %actor_id,
            amount = %amount,
            direction = direction.as_str(),
            "adjust_balance"
        );
        let result = self
            .try_adjust_balance(customer_id, actor_id, amount, direction, reason)
            .await;
        log_rejection("adjust_balance", &result);
        result
    }

    async fn try_adjust_balance(
        &self,
        customer_id: &str,
        actor_id: &str,
        amount: Money,
        direction: LedgerDirection,
        reason: &str,
    ) -> EngineResult<LedgerEntry> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount {
                reason: "adjustment amount must be positive".to_string(),
            }
            .into());
        }
        validate_actor_id(actor_id)?;
        let reason = match reason.trim() {
            "" => default_reason(direction),
            given => {
                validate_reason(given)?;
                given
            }
        };

        let customer = self.load_customer(customer_id).await?;
        if direction == LedgerDirection::Debit {
            check_spend(&customer, amount)?;
        }

        let mut tx = self.db.begin().await?;

        let applied = match direction {
            LedgerDirection::Debit => {
                CustomerRepository::charge(&mut *tx, customer_id, amount.cents()).await?
            }
            LedgerDirection::Credit => {
                CustomerRepository::credit(&mut *tx, customer_id, amount.cents()).await?
            }
        };
        let Some(balance_after) = applied else {
            return Err(explain_charge_miss(&mut *tx, customer_id, amount).await);
        };

        let entry = LedgerEntry {
            id: generate_id(),
            customer_id: customer_id.to_string(),
            amount_cents: amount.cents(),
            direction,
            reason: reason.to_string(),
            actor_id: actor_id.to_string(),
            sale_id: None,
            balance_after_cents: balance_after,
            created_at: Utc::now(),
        };
        LedgerRepository::append(&mut *tx, &entry).await?;

        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            direction = direction.as_str(),
            amount_cents = amount.cents(),
            balance_after_cents = balance_after,
            "Balance adjusted"
        );
        Ok(entry)
    }

    // =========================================================================
    // Snapshot loads
    // =========================================================================

    async fn load_customer(&self, id: &str) -> EngineResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()).into())
    }

    async fn load_product(&self, id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }
}

/// Why `deduct_stock` matched no row, read under the write lock.
async fn explain_stock_miss(conn: &mut SqliteConnection, product_id: &str, qty: i64) -> EngineError {
    match ProductRepository::fetch(conn, product_id).await {
        Ok(Some(product)) => match check_fulfill(&product, qty) {
            Err(rule) => rule.into(),
            Ok(()) => EngineError::Conflict(format!("stock guard missed for {product_id}")),
        },
        Ok(None) => CoreError::ProductNotFound(product_id.to_string()).into(),
        Err(e) => e.into(),
    }
}

/// Why a balance update matched no row, read under the write lock.
async fn explain_charge_miss(
    conn: &mut SqliteConnection,
    customer_id: &str,
    amount: Money,
) -> EngineError {
    match CustomerRepository::fetch(conn, customer_id).await {
        Ok(Some(customer)) => match check_spend(&customer, amount) {
            Err(rule) => rule.into(),
            Ok(()) => EngineError::Conflict(format!("balance guard missed for {customer_id}")),
        },
        Ok(None) => CoreError::CustomerNotFound(customer_id.to_string()).into(),
        Err(e) => e.into(),
    }
}

fn default_reason(direction: LedgerDirection) -> &'static str {
    match direction {
        LedgerDirection::Credit => "Balance top-up",
        LedgerDirection::Debit => "Manual debit",
    }
}

fn log_rejection<T>(operation: &str, result: &EngineResult<T>) {
    if let Err(e) = result {
        warn!(operation, kind = e.kind().code(), error = %e, "Operation rejected");
    }
}
