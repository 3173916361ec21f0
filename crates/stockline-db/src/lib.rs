//! # stockline-db: Database Layer for Stockline
//!
//! SQLite storage for the catalog and sales, and the only place where stock
//! levels change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Data Flow                              │
//! │                                                                         │
//! │  stockline-core (Cart, SaleLineReconciler)                             │
//! │       │  Cart / SaleWriteSet                                            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockline-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ CatalogRepo   │    │  (embedded)  │  │   │
//! │  │   │  AppConfig    │    │ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │  (config.rs)  │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) at <platform data dir>/stockline.db                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockline_core::{search, SaleLineReconciler};
//! use stockline_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let catalog = db.catalog().list_active().await?;
//! let hits = search("basee", &catalog);
//!
//! let record = db.sales().load_record(sale_id).await?;
//! let mut editor = SaleLineReconciler::from_record(&record, &catalog);
//! editor.set_line_quantity(0, 4)?;
//! db.sales().apply_write_set(sale_id, &editor.commit()?, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::{CatalogRepository, NewCatalogItem};
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
