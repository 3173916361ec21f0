//! # Error Types
//!
//! Domain-specific error types for stockline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockline-core errors (this file)                                     │
//! │  ├── CoreError        - Cart / reconciler rule violations              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockline-db errors (separate crate)                                  │
//! │  └── DbError          - Persistence failures (wraps CoreError)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (toast/banner)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantity adjustments never produce errors: they clamp silently. Only the
//! explicit "add" operations and `commit()` can fail.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The product has no stock left to sell.
    ///
    /// ## When This Occurs
    /// - `Cart::add_item` with `stock <= 0`
    /// - `SaleLineReconciler::add_line` / `change_line_product` when the
    ///   product has no headroom
    #[error("Product {name} (id {product_id}) is out of stock")]
    OutOfStock { product_id: i64, name: String },

    /// The product already has a line in the sale being edited.
    #[error("Product {name} (id {product_id}) is already part of this sale")]
    DuplicateProduct { product_id: i64, name: String },

    /// A sale (or cart) would end up without any line item.
    #[error("A sale must contain at least one product")]
    EmptyOrder,

    /// Line index does not address a live line of the working set.
    #[error("Sale line {0} does not exist")]
    LineNotFound(usize),

    /// Product id is not present in the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
