//! # Validation Module
//!
//! Field validators for inbound requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: axum extractors                                              │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation, one ValidationError per field           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (inventory >= 0), CHECK (price_cents >= 0)                  │
//! │  └── UNIQUE (carts.user_id)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{validate_product_name, validate_quantity};
//!
//! assert!(validate_product_name("Accent Chair").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_MONEY_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted product description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
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

/// Validates a product name: non-empty after trimming, at most 100 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, MAX_NAME_LEN)
}

/// Validates a product description: non-empty, at most 1000 characters.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_text("description", description, MAX_DESCRIPTION_LEN)
}

/// Validates the product color list: at least one entry, none blank.
pub fn validate_colors(colors: &[String]) -> ValidationResult<()> {
    if colors.is_empty() || colors.iter().any(|c| c.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "colors".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart or order amount.
///
/// ## Rules
/// ```text
/// amount <= 0   → MustBePositive
/// amount > 999  → OutOfRange
/// ```
pub fn validate_quantity(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if amount > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a money amount that may be zero (price, tax, shipping fee).
///
/// ## Rules
/// ```text
/// cents < 0                → MustNotBeNegative
/// cents > MAX_MONEY_CENTS  → OutOfRange
/// ```
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_non_negative_cents;
///
/// assert!(validate_non_negative_cents("tax", 0).is_ok());
/// assert!(validate_non_negative_cents("tax", -1).is_err());
/// assert!(validate_non_negative_cents("tax", i64::MAX).is_err());
/// ```
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level.
pub fn validate_inventory(inventory: i64) -> ValidationResult<()> {
    if inventory < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "inventory".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in a cart holding `current_lines`.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cartItems".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
