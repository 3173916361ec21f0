//! # Repository Module
//!
//! Database repository implementations for Stockline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │       │  db.catalog().list_active()                                    │
//! │       ▼                                                                 │
//! │  CatalogRepository / SaleRepository / ReportRepository                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products, categories, stock
//! - [`SaleRepository`](sale::SaleRepository) - Sale submission, history, edits
//! - [`ReportRepository`](report::ReportRepository) - Dashboard figures
//!
//! Every write that moves stock goes through [`adjust_stock`], inside the
//! caller's transaction.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

pub mod catalog;
pub mod report;
pub mod sale;

/// Applies a stock delta, refusing to go below zero.
///
/// ## Delta Pattern
/// ```text
///   ❌ UPDATE products SET stock = 7            (lost update)
///   ✅ UPDATE products SET stock = stock - 3    (composes)
/// ```
///
/// Returns the new stock level. Fails with [`DbError::InsufficientStock`]
/// when `stock + delta < 0` and [`DbError::NotFound`] for unknown products.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    delta: i64,
) -> DbResult<i64> {
    debug!(product_id, delta, "Adjusting stock");

    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock + ?2,
            updated_at = datetime('now')
        WHERE id = ?1 AND stock + ?2 >= 0
        RETURNING stock
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = updated {
        return Ok(stock);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => Err(DbError::InsufficientStock {
            product_id,
            available,
            requested: -delta,
        }),
        None => Err(DbError::not_found("Product", product_id)),
    }
}
