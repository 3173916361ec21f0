//! # Validation Module
//!
//! Input validation for values that reach the store.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Presentation                                                  │
//! │  └── Immediate feedback (empty fields, clamped quantities)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Business rules before any write                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  └── NOT NULL, CHECK (stock >= 0), foreign keys                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::validation::{validate_client_name, validate_quantity};
//!
//! assert_eq!(validate_client_name("  Lucía ").unwrap(), "Lucía");
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest client name accepted on a sale.
pub const MAX_CLIENT_NAME_LEN: usize = 120;

/// Longest product or category name accepted in the catalog.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
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

    Ok(value)
}

/// Validates the client name of a sale.
///
/// ## Returns
/// The trimmed name.
pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    required_trimmed("client_name", name, MAX_CLIENT_NAME_LEN).map(str::to_string)
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use stockline_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Base Líquida Mate TimeWise").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_trimmed("name", name, MAX_PRODUCT_NAME_LEN).map(str::to_string)
}

/// Validates a category name.
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    required_trimmed("category", name, MAX_PRODUCT_NAME_LEN).map(str::to_string)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity (> 0).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price in cents (>= 0). Free samples are priced at zero.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock level (>= 0).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
