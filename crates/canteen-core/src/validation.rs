//! # Validation Module
//!
//! Input shape checks applied before any business logic runs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (API layer)                                           │
//! │  └── Types and ranges, already checked before the engine is invoked   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine                                                       │
//! │  ├── THIS MODULE: names, handles, positive amounts                     │
//! │  └── eligibility: stock and balance                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0, price > 0, quantity > 0)                       │
//! │  ├── UNIQUE COLLATE NOCASE (product name, customer handle)             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_HANDLE_LEN: usize = 50;
pub const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use canteen_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Guaraná 350ml").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

/// Validates a customer handle.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, digits, `-`, `_` and `.` only (no spaces)
///
/// ## Example
/// ```rust
/// use canteen_core::validation::validate_handle;
///
/// assert!(validate_handle("alice.s").is_ok());
/// assert!(validate_handle("alice smith").is_err());
/// ```
pub fn validate_handle(handle: &str) -> ValidationResult<()> {
    required_text("handle", handle, MAX_HANDLE_LEN)?;

    if !handle
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "handle".to_string(),
            reason: "must contain only letters, numbers, '-', '_' and '.'".to_string(),
        });
    }

    Ok(())
}

pub fn validate_room(room: &str) -> ValidationResult<()> {
    if room.chars().count() > MAX_HANDLE_LEN {
        return Err(ValidationError::TooLong {
            field: "room".to_string(),
            max: MAX_HANDLE_LEN,
        });
    }
    Ok(())
}

/// Validates the free-text reason attached to a balance adjustment.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    required_text("reason", reason, MAX_REASON_LEN)
}

pub fn validate_actor_id(actor_id: &str) -> ValidationResult<()> {
    required_text("actor_id", actor_id, MAX_HANDLE_LEN * 2)
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a catalog price in cents. Free items are not sold here.
///
/// ## Example
/// ```rust
/// use canteen_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(150).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

pub fn validate_reorder_threshold(threshold: i64) -> ValidationResult<()> {
    if threshold < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "reorder_threshold".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
