//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. SUBMIT                                                              │
//! │     └── create_from_cart() → sale + lines, stock decremented           │
//! │                                                                         │
//! │  2. REVIEW                                                              │
//! │     └── list() / load_record()                                          │
//! │                                                                         │
//! │  3. (OPTIONAL) EDIT                                                     │
//! │     └── SaleLineReconciler::commit() → SaleWriteSet                     │
//! │     └── apply_write_set() → deletes, updates, creates, totals          │
//! │                                                                         │
//! │  4. (OPTIONAL) DELETE                                                   │
//! │     └── delete() → lines restocked, sale removed                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every multi-statement write runs in one transaction. Any failure, including
//! a stock check, rolls the whole thing back.

use chrono::NaiveDate;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use stockline_core::validation::{validate_client_name, validate_quantity};
use stockline_core::{
    Cart, CoreError, Money, PaymentKind, SaleHeader, SaleLineCommand, SaleLineItem, SaleRecord,
    SaleSummary, SaleWriteSet,
};
use tracing::{debug, info, warn};

use super::adjust_stock;
use crate::error::{DbError, DbResult};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: i64,
    sale_date: NaiveDate,
    client_name: String,
    payment_kind: PaymentKind,
    total_cents: i64,
}

impl From<SaleRow> for SaleSummary {
    fn from(row: SaleRow) -> Self {
        SaleSummary {
            id: row.id,
            date: row.sale_date,
            client_name: row.client_name,
            payment_kind: row.payment_kind,
            total: Money::from_cents(row.total_cents),
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: i64,
    product_id: i64,
    name_snapshot: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<LineRow> for SaleLineItem {
    fn from(row: LineRow) -> Self {
        SaleLineItem::persisted(
            row.id,
            row.product_id,
            row.name_snapshot,
            row.quantity,
            Money::from_cents(row.unit_price_cents),
        )
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Turns a cart into a persisted sale.
    ///
    /// ## What This Does
    /// 1. Validates the client name and refuses an empty cart
    /// 2. Inserts the sale header with the cart total
    /// 3. For each line: takes the units off the shelf, inserts the line
    ///
    /// The shelf is re-checked here; a cart built against stock that has
    /// since been sold fails with [`DbError::InsufficientStock`] and nothing
    /// is written.
    pub async fn create_from_cart(&self, header: &SaleHeader, cart: &Cart) -> DbResult<SaleRecord> {
        let header = SaleHeader {
            client_name: validate_client_name(&header.client_name)?,
            ..header.clone()
        };
        let mut lines = cart.to_sale_lines()?;

        let mut tx = self.pool.begin().await?;
        let result = insert_sale(&mut tx, &header, &mut lines).await;
        let sale_id = finish(tx, result, "create sale").await?;

        info!(sale_id, lines = lines.len(), "Sale created");
        Ok(SaleRecord::new(sale_id, header, lines))
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SaleSummary>> {
        let row: Option<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, sale_date, client_name, payment_kind, total_cents
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SaleSummary::from))
    }

    /// Gets all lines of a sale, in insertion order.
    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<SaleLineItem>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, name_snapshot, quantity, unit_price_cents
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLineItem::from).collect())
    }

    /// Loads a sale with its lines, ready for a `SaleLineReconciler`.
    pub async fn load_record(&self, id: i64) -> DbResult<SaleRecord> {
        let summary = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        let lines = self.get_lines(id).await?;

        if lines.iter().map(SaleLineItem::subtotal).sum::<Money>() != summary.total {
            warn!(sale_id = id, stored = %summary.total, "Stored total disagrees with lines");
        }

        Ok(SaleRecord::from_summary(summary, lines))
    }

    /// Lists sales, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<SaleSummary>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, sale_date, client_name, payment_kind, total_cents
            FROM sales
            ORDER BY sale_date DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleSummary::from).collect())
    }

    /// Applies an edit computed by `SaleLineReconciler::commit`.
    ///
    /// ## Unit of Work
    /// ```text
    /// BEGIN
    ///   Delete  → remove row,  stock += persisted quantity
    ///   Update  → new qty,     stock -= (new - persisted)
    ///   Create  → insert row,  stock -= qty
    ///   Totals  → Σ line subtotals (+ header fields when given)
    /// COMMIT   (ROLLBACK on the first failure)
    /// ```
    ///
    /// The stored total is summed from the rows as they stand after the
    /// line commands, never taken from `write_set.new_total`. A write-set
    /// that would leave the sale without lines fails with
    /// [`CoreError::EmptyOrder`].
    ///
    /// Quantities taken back from the shelf are checked against live stock,
    /// so an edit prepared against a stale catalog fails with
    /// [`DbError::InsufficientStock`] rather than overselling.
    pub async fn apply_write_set(
        &self,
        sale_id: i64,
        write_set: &SaleWriteSet,
        header: Option<&SaleHeader>,
    ) -> DbResult<SaleRecord> {
        let header = match header {
            Some(h) => Some(SaleHeader {
                client_name: validate_client_name(&h.client_name)?,
                ..h.clone()
            }),
            None => None,
        };

        debug!(
            sale_id,
            creates = write_set.creates.len(),
            updates = write_set.updates.len(),
            deletes = write_set.deletes.len(),
            "Applying sale write-set"
        );

        let mut tx = self.pool.begin().await?;
        let result = apply_commands(&mut tx, sale_id, write_set, header.as_ref()).await;
        let total = finish(tx, result, "apply write-set").await?;

        info!(sale_id, total = %total, "Sale edited");
        self.load_record(sale_id).await
    }

    /// Deletes a sale and puts its units back on the shelf.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = delete_sale(&mut tx, id).await;
        finish(tx, result, "delete sale").await?;

        info!(sale_id = id, "Sale deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Commits on success, rolls back on failure.
async fn finish<T>(tx: Transaction<'_, Sqlite>, result: DbResult<T>, action: &str) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(action, error = %err, "Rolling back");
            tx.rollback().await?;
            Err(err)
        }
    }
}

async fn insert_sale(
    conn: &mut SqliteConnection,
    header: &SaleHeader,
    lines: &mut [SaleLineItem],
) -> DbResult<i64> {
    let total: Money = lines.iter().map(SaleLineItem::subtotal).sum();

    let sale_id = sqlx::query(
        r#"
        INSERT INTO sales (sale_date, client_name, payment_kind, total_cents)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(header.date)
    .bind(&header.client_name)
    .bind(header.payment_kind)
    .bind(total.cents())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for line in lines.iter_mut() {
        adjust_stock(conn, line.product_id, -line.quantity()).await?;
        line.id = Some(insert_line(conn, sale_id, line).await?);
    }

    Ok(sale_id)
}

async fn insert_line(
    conn: &mut SqliteConnection,
    sale_id: i64,
    line: &SaleLineItem,
) -> DbResult<i64> {
    validate_quantity(line.quantity())?;

    let id = sqlx::query(
        r#"
        INSERT INTO sale_lines (
            sale_id, product_id, name_snapshot,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(sale_id)
    .bind(line.product_id)
    .bind(&line.name)
    .bind(line.quantity())
    .bind(line.unit_price().cents())
    .bind(line.subtotal().cents())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// `(product_id, quantity)` of a persisted line of this sale.
async fn persisted_line(
    conn: &mut SqliteConnection,
    sale_id: i64,
    line_id: i64,
) -> DbResult<(i64, i64)> {
    sqlx::query_as("SELECT product_id, quantity FROM sale_lines WHERE id = ?1 AND sale_id = ?2")
        .bind(line_id)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale line", line_id))
}

async fn apply_commands(
    conn: &mut SqliteConnection,
    sale_id: i64,
    write_set: &SaleWriteSet,
    header: Option<&SaleHeader>,
) -> DbResult<Money> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM sales WHERE id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(DbError::not_found("Sale", sale_id));
    }

    for command in write_set.commands() {
        match command {
            SaleLineCommand::Delete { line_id } => {
                let (product_id, quantity) = persisted_line(conn, sale_id, line_id).await?;
                sqlx::query("DELETE FROM sale_lines WHERE id = ?1")
                    .bind(line_id)
                    .execute(&mut *conn)
                    .await?;
                adjust_stock(conn, product_id, quantity).await?;
            }

            SaleLineCommand::Update { line } => {
                let line_id = line
                    .id
                    .ok_or_else(|| DbError::Internal("update for an unsaved sale line".into()))?;
                validate_quantity(line.quantity())?;
                let (product_id, old_quantity) = persisted_line(conn, sale_id, line_id).await?;
                adjust_stock(conn, product_id, old_quantity - line.quantity()).await?;
                sqlx::query(
                    r#"
                    UPDATE sale_lines
                    SET quantity = ?2, subtotal_cents = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(line_id)
                .bind(line.quantity())
                .bind(line.subtotal().cents())
                .execute(&mut *conn)
                .await?;
            }

            SaleLineCommand::Create { line } => {
                adjust_stock(conn, line.product_id, -line.quantity()).await?;
                insert_line(conn, sale_id, &line).await?;
            }

            SaleLineCommand::UpdateTotals { new_total } => {
                let (line_count, total_cents): (i64, i64) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*), COALESCE(SUM(subtotal_cents), 0)
                    FROM sale_lines
                    WHERE sale_id = ?1
                    "#,
                )
                .bind(sale_id)
                .fetch_one(&mut *conn)
                .await?;

                if line_count == 0 {
                    return Err(CoreError::EmptyOrder.into());
                }

                let total = Money::from_cents(total_cents);
                if total != new_total {
                    warn!(
                        sale_id,
                        expected = %new_total,
                        actual = %total,
                        "Write-set total disagrees with lines"
                    );
                }

                sqlx::query(
                    r#"
                    UPDATE sales SET
                        total_cents = ?2,
                        sale_date = COALESCE(?3, sale_date),
                        client_name = COALESCE(?4, client_name),
                        payment_kind = COALESCE(?5, payment_kind),
                        updated_at = datetime('now')
                    WHERE id = ?1
                    "#,
                )
                .bind(sale_id)
                .bind(total.cents())
                .bind(header.map(|h| h.date))
                .bind(header.map(|h| h.client_name.as_str()))
                .bind(header.map(|h| h.payment_kind))
                .execute(&mut *conn)
                .await?;

                return Ok(total);
            }
        }
    }

    Err(DbError::Internal("write-set without a totals step".into()))
}

async fn delete_sale(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<()> {
    let lines: Vec<(i64, i64)> =
        sqlx::query_as("SELECT product_id, quantity FROM sale_lines WHERE sale_id = ?1")
            .bind(sale_id)
            .fetch_all(&mut *conn)
            .await?;

    for (product_id, quantity) in lines {
        adjust_stock(conn, product_id, quantity).await?;
    }

    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}
