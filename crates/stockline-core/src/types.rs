//! # Domain Types
//!
//! Core domain types used throughout Stockline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │   SaleRecord    │   │  SaleLineItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id (nullable)  │       │
//! │  │  name           │   │  date           │   │  product_id     │       │
//! │  │  category_id    │   │  client_name    │   │  name snapshot  │       │
//! │  │  stock          │   │  payment_kind   │   │  quantity       │       │
//! │  │  unit_price     │   │  total = Σ ───────►│  subtotal       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog items are owned by the catalog store; the core only reads them.
//! Sale lines use the snapshot pattern: name and unit price are frozen when
//! the line is created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A sellable product as seen by the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Unique identifier.
    pub id: i64,

    /// Display name shown to the operator.
    pub name: String,

    /// Optional category reference.
    pub category_id: Option<i64>,

    /// Units currently on the shelf (never negative once persisted).
    pub stock: i64,

    /// Current unit price.
    pub unit_price: Money,
}

impl CatalogItem {
    /// Creates an uncategorized catalog item.
    pub fn new(id: i64, name: impl Into<String>, stock: i64, unit_price: Money) -> Self {
        CatalogItem {
            id,
            name: name.into(),
            category_id: None,
            stock,
            unit_price,
        }
    }

    /// Checks if at least one unit can be sold right now.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Payment Kind
// =============================================================================

/// How the client pays for a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Paid in full at the counter.
    #[default]
    Cash,
    /// Paid in partial installments.
    Installment,
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A line item of a sale.
///
/// ## Invariant
/// `subtotal == quantity × unit_price`. The fields that feed the subtotal are
/// private so it can only change through [`SaleLineItem::set_quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    /// Row identifier; `None` until persisted.
    pub id: Option<i64>,

    pub product_id: i64,

    /// Product name at time of sale (frozen).
    pub name: String,

    quantity: i64,

    /// Unit price at time of sale (frozen).
    unit_price: Money,

    subtotal: Money,
}

impl SaleLineItem {
    /// Creates a line that has not been persisted yet.
    pub fn new(product_id: i64, name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        SaleLineItem {
            id: None,
            product_id,
            name: name.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply_quantity(quantity),
        }
    }

    /// Rebuilds a persisted line; the subtotal is recomputed, not trusted.
    pub fn persisted(
        id: i64,
        product_id: i64,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        SaleLineItem {
            id: Some(id),
            ..SaleLineItem::new(product_id, name, quantity, unit_price)
        }
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Changes the quantity and recomputes the subtotal.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.subtotal = self.unit_price.multiply_quantity(quantity);
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// Header fields of a sale that are not derived from its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeader {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub client_name: String,
    pub payment_kind: PaymentKind,
}

/// A persisted sale with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub client_name: String,
    pub payment_kind: PaymentKind,
    /// Always Σ of line subtotals.
    pub total: Money,
    pub lines: Vec<SaleLineItem>,
}

impl SaleRecord {
    /// Assembles a sale; the total is derived from the lines.
    pub fn new(id: i64, header: SaleHeader, lines: Vec<SaleLineItem>) -> Self {
        let total = lines.iter().map(SaleLineItem::subtotal).sum();
        SaleRecord {
            id,
            date: header.date,
            client_name: header.client_name,
            payment_kind: header.payment_kind,
            total,
            lines,
        }
    }

    /// Attaches lines to a listed sale; the total is recomputed from them.
    pub fn from_summary(summary: SaleSummary, lines: Vec<SaleLineItem>) -> Self {
        let header = SaleHeader {
            date: summary.date,
            client_name: summary.client_name,
            payment_kind: summary.payment_kind,
        };
        SaleRecord::new(summary.id, header, lines)
    }

    /// Returns the header part of the record.
    pub fn header(&self) -> SaleHeader {
        SaleHeader {
            date: self.date,
            client_name: self.client_name.clone(),
            payment_kind: self.payment_kind,
        }
    }
}

/// A sale without its lines, for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub client_name: String,
    pub payment_kind: PaymentKind,
    pub total: Money,
}

/// Best-selling product summary for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub name: String,
    pub units: i64,
    pub revenue: Money,
}
