//! # Cart
//!
//! Session-scoped accumulator for the sale being composed at the counter.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator Action          Cart Method             Cart State Change     │
//! │  ───────────────          ───────────             ─────────────────     │
//! │                                                                         │
//! │  Click Product ─────────► add_item() ───────────► push / qty + 1       │
//! │                                                   (OutOfStock if 0)     │
//! │                                                                         │
//! │  Change Quantity ───────► set_quantity() ───────► clamp to [1, stock]  │
//! │                                                                         │
//! │  Click Remove ──────────► remove_line() ────────► line dropped         │
//! │                                                                         │
//! │  Click Clear ───────────► clear() ──────────────► lines emptied        │
//! │                                                                         │
//! │  Submit ────────────────► to_sale_lines() ──────► handed to storage    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding again increases quantity)
//! - `1 ≤ quantity ≤ stock` where stock is the latest live value seen
//!
//! The cart is a plain value owned by whoever runs the session; there is
//! no global cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, SaleLineItem};

/// A line in the cart.
///
/// Name and unit price are frozen when the line is created. `stock_at_add`
/// is only a display hint; the quantity bound is `stock`, refreshed whenever
/// the cart sees the product again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub stock_at_add: i64,
    /// Latest live stock observed for this product.
    pub stock: i64,
}

impl CartLine {
    fn from_item(item: &CatalogItem) -> Self {
        CartLine {
            product_id: item.id,
            name: item.name.clone(),
            quantity: 1,
            unit_price: item.unit_price,
            stock_at_add: item.stock,
            stock: item.stock,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn clamp(&self, requested: i64) -> i64 {
        requested.min(self.stock).max(1)
    }
}

/// The cart for one counter session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - `item.stock <= 0`: fails with [`CoreError::OutOfStock`]
    /// - already in cart: quantity + 1, clamped to `item.stock`
    /// - not in cart: new line with quantity 1
    pub fn add_item(&mut self, item: &CatalogItem) -> CoreResult<()> {
        if !item.in_stock() {
            return Err(CoreError::OutOfStock {
                product_id: item.id,
                name: item.name.clone(),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == item.id) {
            line.stock = item.stock;
            line.quantity = line.clamp(line.quantity + 1);
            return Ok(());
        }

        self.lines.push(CartLine::from_item(item));
        Ok(())
    }

    /// Sets the quantity of a line, clamped into `[1, stock]`.
    ///
    /// Never fails. Returns the quantity actually stored, or `None` when the
    /// product has no line; callers that care about clamping compare it with
    /// what they asked for.
    pub fn set_quantity(&mut self, product_id: i64, requested: i64) -> Option<i64> {
        let line = self.lines.iter_mut().find(|l| l.product_id == product_id)?;
        line.quantity = line.clamp(requested);
        Some(line.quantity)
    }

    /// Updates every line's stock bound from a fresh catalog listing and
    /// re-clamps quantities. Products missing from the listing keep their
    /// last known bound.
    ///
    /// Lines whose product has sold out are dropped, since no quantity
    /// satisfies `1 ≤ quantity ≤ 0`. Returns the dropped product ids so the
    /// caller can tell the operator.
    pub fn refresh_stock(&mut self, catalog: &[CatalogItem]) -> Vec<i64> {
        for line in &mut self.lines {
            if let Some(item) = catalog.iter().find(|i| i.id == line.product_id) {
                line.stock = item.stock;
                line.quantity = line.clamp(line.quantity);
            }
        }

        let sold_out: Vec<i64> = self
            .lines
            .iter()
            .filter(|l| l.stock <= 0)
            .map(|l| l.product_id)
            .collect();
        self.lines.retain(|l| l.stock > 0);
        sold_out
    }

    /// Removes a line; no-op if the product is not in the cart.
    pub fn remove_line(&mut self, product_id: i64) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns a line by product id.
    pub fn line(&self, product_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Converts the cart into unsaved sale lines for submission.
    ///
    /// An empty cart cannot become a sale.
    pub fn to_sale_lines(&self) -> CoreResult<Vec<SaleLineItem>> {
        if self.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        Ok(self
            .lines
            .iter()
            .map(|l| SaleLineItem::new(l.product_id, l.name.clone(), l.quantity, l.unit_price))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_liquida() -> CatalogItem {
        CatalogItem::new(1, "Base Líquida", 3, Money::from_cents(10_000))
    }

    fn crema() -> CatalogItem {
        CatalogItem::new(2, "Crema", 0, Money::from_cents(5_000))
    }

    #[test]
    fn test_add_item_twice_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();
        cart.add_item(&base_liquida()).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(1).unwrap().quantity, 2);
        assert_eq!(cart.subtotal(), Money::from_cents(20_000));
    }

    #[test]
    fn test_add_out_of_stock_fails() {
        let mut cart = Cart::new();
        let err = cart.add_item(&crema()).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { product_id: 2, .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_item_clamps_to_stock() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add_item(&base_liquida()).unwrap();
        }
        assert_eq!(cart.line(1).unwrap().quantity, 3);
    }

    #[test]
    fn test_set_quantity_clamps_both_ends() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();

        assert_eq!(cart.set_quantity(1, 1000), Some(3));
        assert_eq!(cart.set_quantity(1, 0), Some(1));
        assert_eq!(cart.set_quantity(1, -4), Some(1));
        assert_eq!(cart.set_quantity(1, 2), Some(2));
        assert_eq!(cart.set_quantity(99, 2), None);
    }

    #[test]
    fn test_bound_follows_live_stock() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();

        let restocked = CatalogItem {
            stock: 10,
            ..base_liquida()
        };
        cart.add_item(&restocked).unwrap();
        assert_eq!(cart.set_quantity(1, 1000), Some(10));
        assert_eq!(cart.line(1).unwrap().stock_at_add, 3);

        let sold_elsewhere = CatalogItem {
            stock: 4,
            ..base_liquida()
        };
        assert!(cart.refresh_stock(&[sold_elsewhere]).is_empty());
        assert_eq!(cart.line(1).unwrap().quantity, 4);
    }

    #[test]
    fn test_refresh_drops_sold_out_lines() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();
        cart.add_item(&CatalogItem::new(3, "Rímel", 5, Money::from_cents(2_000)))
            .unwrap();

        let sold_out = CatalogItem {
            stock: 0,
            ..base_liquida()
        };
        assert_eq!(cart.refresh_stock(&[sold_out]), vec![1]);
        assert!(cart.line(1).is_none());
        assert_eq!(cart.len(), 1);
        assert!(cart.lines().iter().all(|l| l.quantity <= l.stock));
    }

    #[test]
    fn test_remove_then_readd_starts_at_one() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();
        cart.set_quantity(1, 3);

        cart.remove_line(1);
        assert!(cart.line(1).is_none());
        cart.remove_line(1); // no-op

        cart.add_item(&base_liquida()).unwrap();
        assert_eq!(cart.line(1).unwrap().quantity, 1);
    }

    #[test]
    fn test_clear_and_empty_submission() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();
        assert_eq!(cart.to_sale_lines().unwrap().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
        assert_eq!(cart.to_sale_lines().unwrap_err(), CoreError::EmptyOrder);
    }

    #[test]
    fn test_sale_lines_carry_snapshots() {
        let mut cart = Cart::new();
        cart.add_item(&base_liquida()).unwrap();
        cart.add_item(&base_liquida()).unwrap();

        let lines = cart.to_sale_lines().unwrap();
        assert_eq!(lines[0].id, None);
        assert_eq!(lines[0].name, "Base Líquida");
        assert_eq!(lines[0].quantity(), 2);
        assert_eq!(lines[0].subtotal(), Money::from_cents(20_000));
    }
}
