//! # stockline-core: Pure Business Logic for Stockline
//!
//! This crate holds the two pieces of the product that are easy to get
//! subtly wrong: the typo-tolerant catalog search and the stock-aware
//! editing of sale lines. Everything here is a pure function or a
//! session-local state machine. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Presentation layer                           │   │
//! │  │    Catalog search ──► Cart ──► Submit ──► Sale history/edit    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ normalize │─►│  search   │  │   cart    │  │ reconcile │  │   │
//! │  │   │  text     │  │ Levensh.  │  │ CartLine  │  │ WriteSet  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SaleWriteSet                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockline-db (Database Layer)                      │   │
//! │  │        SQLite, migrations, unit-of-work application             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`normalize`] - Text canonicalization for comparisons
//! - [`search`] - Fuzzy catalog search
//! - [`cart`] - Draft sale composition
//! - [`reconcile`] - Editing a persisted sale against live stock
//! - [`types`] - Domain types (CatalogItem, SaleRecord, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockline_core::{search, Cart, CatalogItem, Money};
//!
//! let catalog = vec![
//!     CatalogItem::new(1, "Base Líquida", 3, Money::from_cents(10_000)),
//!     CatalogItem::new(2, "Crema", 0, Money::from_cents(5_000)),
//! ];
//!
//! let hits = search("basee", &catalog);
//! assert_eq!(hits[0].id, 1);
//!
//! let mut cart = Cart::new();
//! cart.add_item(&hits[0]).unwrap();
//! cart.add_item(&hits[0]).unwrap();
//! assert_eq!(cart.subtotal(), Money::from_cents(20_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod normalize;
pub mod reconcile;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::normalize;
pub use reconcile::{
    EditableSaleLine, LineStatus, SaleLineCommand, SaleLineReconciler, SaleWriteSet,
};
pub use search::{rank, search, ScoredCandidate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of nearest candidates returned when nothing crosses the threshold.
pub const FALLBACK_RESULTS: usize = 3;

/// Stock level at or below which a product counts as running low.
///
/// Matches the "low" badge threshold of the sale screen.
pub const LOW_STOCK_THRESHOLD: i64 = 3;
