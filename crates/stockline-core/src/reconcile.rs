//! # Sale Line Reconciliation
//!
//! Editing the lines of a sale that has already been persisted, without
//! breaking stock accounting.
//!
//! ## The Headroom Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale #12 was saved with 5 × Base Líquida. Shelf now shows 2.           │
//! │                                                                         │
//! │  Those 5 units already left the shelf FOR THIS SALE, so the line may   │
//! │  hold up to:                                                            │
//! │                                                                         │
//! │     headroom = live stock (2) + reserved by this line (5) = 7           │
//! │                                                                         │
//! │  Swap the line to Crema (stock 10):                                     │
//! │     reservation stays with Base Líquida → headroom = 10, quantity = 1   │
//! │                                                                         │
//! │  Units a removed/swapped line gives back are available to any other    │
//! │  line of the same product in this session.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Status
//! ```text
//!                 change_line_product            remove_line (persisted)
//!   Unchanged ──────────────────────► ProductSwapped ─────────────┐
//!     ▲   │  ◄── swap back to original ──┘                        ▼
//!     │   └──────────────────────────────────────────► MarkedForDeletion
//!     │
//!   (loaded)        NewlyAdded ── remove_line ──► dropped from the working set
//! ```
//!
//! ## Commit
//! `commit()` partitions the working set into a [`SaleWriteSet`]. The
//! reconciler never touches storage; the caller hands the write-set to the
//! persistence layer, which applies it as a single unit of work.

use std::collections::HashMap;

use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, SaleLineItem, SaleRecord};

// =============================================================================
// Line Status
// =============================================================================

/// Where a working line stands relative to what is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Persisted line still holding its original product (quantity may differ).
    Unchanged,
    /// Persisted line now pointing at a different product.
    ProductSwapped,
    /// Line created during this session; never persisted.
    NewlyAdded,
    /// Persisted line the operator removed; its delete is still pending.
    MarkedForDeletion,
}

// =============================================================================
// Editable Sale Line
// =============================================================================

/// Working copy of one sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EditableSaleLine {
    pub line: SaleLineItem,
    /// Product the persisted row references (the line's own product if new).
    pub original_product_id: i64,
    /// Quantity the persisted row holds (0 if new).
    pub original_quantity: i64,
    pub status: LineStatus,
    #[serde(skip)]
    #[ts(skip)]
    original_snapshot: Option<(String, Money)>,
}

impl EditableSaleLine {
    fn loaded(line: &SaleLineItem) -> Self {
        EditableSaleLine {
            line: line.clone(),
            original_product_id: line.product_id,
            original_quantity: line.quantity(),
            status: LineStatus::Unchanged,
            original_snapshot: Some((line.name.clone(), line.unit_price())),
        }
    }

    fn added(product: &CatalogItem) -> Self {
        EditableSaleLine {
            line: SaleLineItem::new(product.id, product.name.clone(), 1, product.unit_price),
            original_product_id: product.id,
            original_quantity: 0,
            status: LineStatus::NewlyAdded,
            original_snapshot: None,
        }
    }

    /// Still part of the sale after commit.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.status != LineStatus::MarkedForDeletion
    }

    #[inline]
    fn is_persisted(&self) -> bool {
        self.line.id.is_some()
    }

    /// Units of `original_product_id` this line gives back to the shelf.
    fn released_quantity(&self) -> i64 {
        let gave_up_product = !self.is_live() || self.line.product_id != self.original_product_id;
        if self.is_persisted() && gave_up_product {
            self.original_quantity
        } else {
            0
        }
    }
}

// =============================================================================
// Write Set
// =============================================================================

/// The minimal set of writes that turns the persisted sale into the edited one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleWriteSet {
    /// Lines to insert (ids are `None`).
    pub creates: Vec<SaleLineItem>,
    /// Persisted lines whose quantity changed.
    pub updates: Vec<SaleLineItem>,
    /// Persisted line ids to delete.
    pub deletes: Vec<i64>,
    /// Σ subtotal of surviving lines.
    pub new_total: Money,
}

/// One step of a write-set, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleLineCommand {
    Delete { line_id: i64 },
    Update { line: SaleLineItem },
    Create { line: SaleLineItem },
    UpdateTotals { new_total: Money },
}

impl SaleWriteSet {
    /// Flattens the write-set into ordered commands.
    ///
    /// Deletes run first so that units they give back are on the shelf
    /// before updates and creates draw from it; the total is written last.
    pub fn commands(&self) -> Vec<SaleLineCommand> {
        let deletes = self
            .deletes
            .iter()
            .map(|&line_id| SaleLineCommand::Delete { line_id });
        let updates = self
            .updates
            .iter()
            .map(|line| SaleLineCommand::Update { line: line.clone() });
        let creates = self
            .creates
            .iter()
            .map(|line| SaleLineCommand::Create { line: line.clone() });

        deletes
            .chain(updates)
            .chain(creates)
            .chain(std::iter::once(SaleLineCommand::UpdateTotals {
                new_total: self.new_total,
            }))
            .collect()
    }

    /// No line changes at all.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Working set for editing one persisted sale.
///
/// Indexes address the working set, including lines marked for deletion.
/// Removing a never-persisted line shifts the indexes after it.
#[derive(Debug, Clone)]
pub struct SaleLineReconciler {
    lines: Vec<EditableSaleLine>,
    catalog: HashMap<i64, CatalogItem>,
}

impl SaleLineReconciler {
    /// Loads persisted lines against the current catalog.
    pub fn new(lines: &[SaleLineItem], catalog: &[CatalogItem]) -> Self {
        SaleLineReconciler {
            lines: lines.iter().map(EditableSaleLine::loaded).collect(),
            catalog: catalog.iter().map(|item| (item.id, item.clone())).collect(),
        }
    }

    /// Loads the lines of a sale record.
    pub fn from_record(record: &SaleRecord, catalog: &[CatalogItem]) -> Self {
        Self::new(&record.lines, catalog)
    }

    /// The whole working set, including lines pending deletion.
    pub fn lines(&self) -> &[EditableSaleLine] {
        &self.lines
    }

    /// Lines that will survive the commit.
    pub fn live_lines(&self) -> impl Iterator<Item = &EditableSaleLine> {
        self.lines.iter().filter(|l| l.is_live())
    }

    /// Running total of surviving lines.
    pub fn total(&self) -> Money {
        self.live_lines().map(|l| l.line.subtotal()).sum()
    }

    /// Maximum quantity the line at `index` may hold.
    pub fn headroom(&self, index: usize) -> CoreResult<i64> {
        let line = self.live_line(index)?;
        Ok(self.headroom_for(Some(index), line.line.product_id))
    }

    /// Appends a new line for `product` with quantity 1.
    ///
    /// `product` is taken as the freshest view of that catalog entry.
    pub fn add_line(&mut self, product: &CatalogItem) -> CoreResult<usize> {
        self.ensure_not_present(product, None)?;
        self.catalog.insert(product.id, product.clone());

        if self.headroom_for(None, product.id) < 1 {
            return Err(out_of_stock(product));
        }

        self.lines.push(EditableSaleLine::added(product));
        Ok(self.lines.len() - 1)
    }

    /// Points the line at another catalog product.
    ///
    /// Name and price are taken from the catalog and quantity resets to 1.
    /// Swapping a persisted line back to its original product restores the
    /// original snapshot and reservation.
    pub fn change_line_product(&mut self, index: usize, new_product_id: i64) -> CoreResult<()> {
        let current = self.live_line(index)?.line.product_id;
        if current == new_product_id {
            return Ok(());
        }

        let product = self
            .catalog
            .get(&new_product_id)
            .cloned()
            .ok_or(CoreError::ProductNotFound(new_product_id))?;

        self.ensure_not_present(&product, Some(index))?;

        if self.headroom_for(Some(index), new_product_id) < 1 {
            return Err(out_of_stock(&product));
        }

        let editable = &mut self.lines[index];
        let (name, unit_price, status) = match (&editable.original_snapshot, editable.status) {
            (_, LineStatus::NewlyAdded) => {
                editable.original_product_id = product.id;
                (product.name.clone(), product.unit_price, LineStatus::NewlyAdded)
            }
            (Some((name, price)), _) if product.id == editable.original_product_id => {
                (name.clone(), *price, LineStatus::Unchanged)
            }
            _ => (product.name.clone(), product.unit_price, LineStatus::ProductSwapped),
        };

        let id = editable.line.id;
        editable.line = SaleLineItem::new(product.id, name, 1, unit_price);
        editable.line.id = id;
        editable.status = status;
        Ok(())
    }

    /// Sets a line's quantity, clamped into `[1, headroom]`.
    ///
    /// Returns the quantity actually stored.
    pub fn set_line_quantity(&mut self, index: usize, requested: i64) -> CoreResult<i64> {
        let headroom = self.headroom(index)?;
        let quantity = requested.min(headroom).max(1);
        self.lines[index].line.set_quantity(quantity);
        Ok(quantity)
    }

    /// Removes a line.
    ///
    /// Persisted lines stay in the working set marked for deletion so the
    /// delete is emitted; new lines are dropped outright.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        let line = self.lines.get_mut(index).ok_or(CoreError::LineNotFound(index))?;

        if line.is_persisted() {
            line.status = LineStatus::MarkedForDeletion;
        } else {
            self.lines.remove(index);
        }
        Ok(())
    }

    /// Computes the write-set for the current working set.
    ///
    /// Fails with [`CoreError::EmptyOrder`] when no line would survive.
    pub fn commit(&self) -> CoreResult<SaleWriteSet> {
        if self.live_lines().next().is_none() {
            return Err(CoreError::EmptyOrder);
        }

        let mut write_set = SaleWriteSet {
            new_total: self.total(),
            ..SaleWriteSet::default()
        };

        for editable in &self.lines {
            match (editable.status, editable.line.id) {
                (LineStatus::Unchanged, Some(_)) => {
                    if editable.line.quantity() != editable.original_quantity {
                        write_set.updates.push(editable.line.clone());
                    }
                }
                (LineStatus::Unchanged, None) | (LineStatus::NewlyAdded, _) => {
                    write_set.creates.push(unsaved(&editable.line));
                }
                (LineStatus::ProductSwapped, Some(old_id)) => {
                    write_set.deletes.push(old_id);
                    write_set.creates.push(unsaved(&editable.line));
                }
                (LineStatus::ProductSwapped, None) => {
                    write_set.creates.push(unsaved(&editable.line));
                }
                (LineStatus::MarkedForDeletion, Some(old_id)) => {
                    write_set.deletes.push(old_id);
                }
                (LineStatus::MarkedForDeletion, None) => {}
            }
        }

        Ok(write_set)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn live_line(&self, index: usize) -> CoreResult<&EditableSaleLine> {
        self.lines
            .get(index)
            .filter(|l| l.is_live())
            .ok_or(CoreError::LineNotFound(index))
    }

    /// Live stock of the product plus units given back by this session,
    /// plus the line's own reservation when it targets its original product.
    fn headroom_for(&self, index: Option<usize>, product_id: i64) -> i64 {
        let stock = self.catalog.get(&product_id).map_or(0, |item| item.stock.max(0));

        let released: i64 = self
            .lines
            .iter()
            .enumerate()
            .filter(|(j, l)| Some(*j) != index && l.original_product_id == product_id)
            .map(|(_, l)| l.released_quantity())
            .sum();

        let own = index
            .map(|i| &self.lines[i])
            .filter(|l| l.is_persisted() && l.original_product_id == product_id)
            .map_or(0, |l| l.original_quantity);

        stock + released + own
    }

    fn ensure_not_present(&self, product: &CatalogItem, skip: Option<usize>) -> CoreResult<()> {
        let duplicate = self
            .lines
            .iter()
            .enumerate()
            .any(|(j, l)| Some(j) != skip && l.is_live() && l.line.product_id == product.id);

        if duplicate {
            return Err(CoreError::DuplicateProduct {
                product_id: product.id,
                name: product.name.clone(),
            });
        }
        Ok(())
    }
}

fn out_of_stock(product: &CatalogItem) -> CoreError {
    CoreError::OutOfStock {
        product_id: product.id,
        name: product.name.clone(),
    }
}

/// Copy of a line without its persisted id, for re-insertion.
fn unsaved(line: &SaleLineItem) -> SaleLineItem {
    let mut copy = line.clone();
    copy.id = None;
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: i64 = 1;
    const Q: i64 = 2;
    const R: i64 = 3;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(P, "Base Líquida", 2, Money::from_cents(10_000)),
            CatalogItem::new(Q, "Crema", 10, Money::from_cents(5_000)),
            CatalogItem::new(R, "Labial", 0, Money::from_cents(3_000)),
        ]
    }

    /// Persisted sale: 5 × P at the historical price of $90.00.
    fn reconciler() -> SaleLineReconciler {
        let lines = vec![SaleLineItem::persisted(
            100,
            P,
            "Base Líquida",
            5,
            Money::from_cents(9_000),
        )];
        SaleLineReconciler::new(&lines, &catalog())
    }

    #[test]
    fn test_loaded_lines_are_unchanged() {
        let r = reconciler();
        assert_eq!(r.lines().len(), 1);
        assert_eq!(r.lines()[0].status, LineStatus::Unchanged);
        assert_eq!(r.lines()[0].original_product_id, P);
        assert_eq!(r.lines()[0].original_quantity, 5);
        assert_eq!(r.total(), Money::from_cents(45_000));
    }

    #[test]
    fn test_headroom_includes_own_reservation() {
        let mut r = reconciler();
        assert_eq!(r.headroom(0).unwrap(), 7);

        assert_eq!(r.set_line_quantity(0, 50).unwrap(), 7);
        assert_eq!(r.set_line_quantity(0, 0).unwrap(), 1);
        assert_eq!(r.set_line_quantity(0, 6).unwrap(), 6);
        assert_eq!(r.lines()[0].line.subtotal(), Money::from_cents(54_000));
    }

    #[test]
    fn test_swap_drops_reservation() {
        let mut r = reconciler();
        r.change_line_product(0, Q).unwrap();

        let line = &r.lines()[0];
        assert_eq!(line.status, LineStatus::ProductSwapped);
        assert_eq!(line.line.quantity(), 1);
        assert_eq!(line.line.name, "Crema");
        assert_eq!(line.line.unit_price(), Money::from_cents(5_000));
        assert_eq!(r.headroom(0).unwrap(), 10);
        assert_eq!(r.set_line_quantity(0, 11).unwrap(), 10);
    }

    #[test]
    fn test_swap_back_restores_snapshot_and_reservation() {
        let mut r = reconciler();
        r.change_line_product(0, Q).unwrap();
        r.change_line_product(0, P).unwrap();

        let line = &r.lines()[0];
        assert_eq!(line.status, LineStatus::Unchanged);
        assert_eq!(line.line.unit_price(), Money::from_cents(9_000));
        assert_eq!(r.headroom(0).unwrap(), 7);
    }

    #[test]
    fn test_swap_to_out_of_stock_or_unknown_product() {
        let mut r = reconciler();
        assert!(matches!(
            r.change_line_product(0, R),
            Err(CoreError::OutOfStock { product_id: R, .. })
        ));
        assert_eq!(r.change_line_product(0, 99), Err(CoreError::ProductNotFound(99)));
        assert_eq!(r.change_line_product(5, Q), Err(CoreError::LineNotFound(5)));
        assert_eq!(r.lines()[0].status, LineStatus::Unchanged);
    }

    #[test]
    fn test_add_line_rejects_duplicates_and_empty_shelves() {
        let mut r = reconciler();
        let cat = catalog();

        assert!(matches!(
            r.add_line(&cat[0]),
            Err(CoreError::DuplicateProduct { product_id: P, .. })
        ));
        assert!(matches!(r.add_line(&cat[2]), Err(CoreError::OutOfStock { .. })));

        let index = r.add_line(&cat[1]).unwrap();
        assert_eq!(index, 1);
        assert_eq!(r.lines()[1].status, LineStatus::NewlyAdded);
        assert_eq!(r.lines()[1].line.quantity(), 1);
        assert!(matches!(r.add_line(&cat[1]), Err(CoreError::DuplicateProduct { .. })));
    }

    #[test]
    fn test_swap_into_product_already_in_sale_is_duplicate() {
        let mut r = reconciler();
        r.add_line(&catalog()[1]).unwrap();
        assert!(matches!(
            r.change_line_product(1, P),
            Err(CoreError::DuplicateProduct { .. })
        ));
    }

    #[test]
    fn test_readding_deleted_product_gets_released_units() {
        let mut r = reconciler();
        r.remove_line(0).unwrap();
        assert_eq!(r.lines()[0].status, LineStatus::MarkedForDeletion);

        let index = r.add_line(&catalog()[0]).unwrap();
        assert_eq!(r.headroom(index).unwrap(), 7);
        assert_eq!(r.headroom(0), Err(CoreError::LineNotFound(0)));
    }

    #[test]
    fn test_remove_new_line_drops_it() {
        let mut r = reconciler();
        r.add_line(&catalog()[1]).unwrap();
        r.remove_line(1).unwrap();
        assert_eq!(r.lines().len(), 1);
        assert_eq!(r.remove_line(1), Err(CoreError::LineNotFound(1)));
    }

    #[test]
    fn test_commit_without_changes_is_empty() {
        let r = reconciler();
        let ws = r.commit().unwrap();
        assert!(ws.is_empty());
        assert_eq!(ws.new_total, Money::from_cents(45_000));
        assert_eq!(
            ws.commands(),
            vec![SaleLineCommand::UpdateTotals {
                new_total: Money::from_cents(45_000)
            }]
        );
    }

    #[test]
    fn test_commit_quantity_edit_is_update() {
        let mut r = reconciler();
        r.set_line_quantity(0, 3).unwrap();

        let ws = r.commit().unwrap();
        assert_eq!(ws.updates.len(), 1);
        assert_eq!(ws.updates[0].id, Some(100));
        assert_eq!(ws.updates[0].quantity(), 3);
        assert!(ws.creates.is_empty() && ws.deletes.is_empty());
        assert_eq!(ws.new_total, Money::from_cents(27_000));
    }

    #[test]
    fn test_commit_swap_is_delete_plus_create() {
        let mut r = reconciler();
        r.change_line_product(0, Q).unwrap();
        r.set_line_quantity(0, 4).unwrap();

        let ws = r.commit().unwrap();
        assert_eq!(ws.deletes, vec![100]);
        assert_eq!(ws.creates.len(), 1);
        assert_eq!(ws.creates[0].id, None);
        assert_eq!(ws.creates[0].product_id, Q);
        assert_eq!(ws.creates[0].quantity(), 4);
        assert!(ws.updates.is_empty());
        assert_eq!(ws.new_total, Money::from_cents(20_000));

        let commands = ws.commands();
        assert!(matches!(commands[0], SaleLineCommand::Delete { line_id: 100 }));
        assert!(matches!(commands[1], SaleLineCommand::Create { .. }));
        assert!(matches!(commands[2], SaleLineCommand::UpdateTotals { .. }));
    }

    #[test]
    fn test_commit_mixed_edit() {
        let lines = vec![
            SaleLineItem::persisted(100, P, "Base Líquida", 5, Money::from_cents(9_000)),
            SaleLineItem::persisted(101, Q, "Crema", 2, Money::from_cents(5_000)),
        ];
        let mut r = SaleLineReconciler::new(&lines, &catalog());
        r.remove_line(0).unwrap();
        r.set_line_quantity(1, 12).unwrap(); // 10 on shelf + 2 reserved

        let ws = r.commit().unwrap();
        assert_eq!(ws.deletes, vec![100]);
        assert_eq!(ws.updates[0].quantity(), 12);
        assert_eq!(ws.new_total, Money::from_cents(60_000));
    }

    #[test]
    fn test_commit_requires_one_surviving_line() {
        let mut r = reconciler();
        r.remove_line(0).unwrap();
        assert_eq!(r.commit(), Err(CoreError::EmptyOrder));

        r.add_line(&catalog()[1]).unwrap();
        let ws = r.commit().unwrap();
        assert_eq!(ws.deletes, vec![100]);
        assert_eq!(ws.creates.len(), 1);
    }

    #[test]
    fn test_from_empty_sale_commit_fails() {
        let r = SaleLineReconciler::new(&[], &catalog());
        assert_eq!(r.commit(), Err(CoreError::EmptyOrder));
    }
}
