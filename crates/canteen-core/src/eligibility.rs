//! # Eligibility
//!
//! Pure predicates over entity snapshots: may this product cover a line,
//! may this customer spend an amount.
//!
//! ```text
//!   snapshot (read outside the write lock)
//!        │
//!        ▼
//!   can_fulfill / can_spend      ← fast rejection, no side effects
//!        │
//!        ▼
//!   atomic apply re-checks the same conditions in SQL under the lock
//! ```
//!
//! The `check_*` variants return the caller-visible error instead of a bool.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, Product};

/// True iff the product is active and has at least `requested` units.
#[inline]
pub fn can_fulfill(product: &Product, requested: i64) -> bool {
    product.is_active && product.stock >= requested
}

/// True iff the customer is active and is Staff or can cover `amount`.
#[inline]
pub fn can_spend(customer: &Customer, amount: Money) -> bool {
    customer.is_active && (customer.category.may_go_negative() || customer.balance() >= amount)
}

/// Explains why `can_fulfill` would be false.
pub fn check_fulfill(product: &Product, requested: i64) -> CoreResult<()> {
    if !product.is_active {
        return Err(CoreError::ProductInactive(product.id.clone()));
    }
    if product.stock < requested {
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.stock,
            requested,
        });
    }
    Ok(())
}

/// Explains why `can_spend` would be false.
pub fn check_spend(customer: &Customer, amount: Money) -> CoreResult<()> {
    if !customer.is_active {
        return Err(CoreError::CustomerInactive(customer.id.clone()));
    }
    if !can_spend(customer, amount) {
        return Err(CoreError::InsufficientBalance {
            available: customer.balance(),
            required: amount,
        });
    }
    Ok(())
}
