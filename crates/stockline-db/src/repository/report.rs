//! # Report Repository
//!
//! Read-only figures for the dashboard.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use stockline_core::{Money, TopProduct};

use crate::error::DbResult;

/// Repository for dashboard queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Best sellers by revenue, grouped by the name printed on the lines.
    ///
    /// Grouping by the snapshot keeps renamed products apart, matching what
    /// the receipts said at the time.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT name_snapshot, SUM(quantity), SUM(subtotal_cents) AS revenue
            FROM sale_lines
            GROUP BY name_snapshot
            ORDER BY revenue DESC, name_snapshot
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, units, revenue)| TopProduct {
                name,
                units,
                revenue: Money::from_cents(revenue),
            })
            .collect())
    }

    /// Sum of sale totals dated `day`.
    pub async fn total_for_day(&self, day: NaiveDate) -> DbResult<Money> {
        self.total_between(day, day).await
    }

    /// Sum of sale totals dated within `[from, to]`, both inclusive.
    pub async fn total_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE sale_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::catalog::NewCatalogItem;
    use crate::{Database, DbConfig};
    use stockline_core::{Cart, PaymentKind, SaleHeader};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_empty_database_reports_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.reports().top_products(5).await.unwrap().is_empty());
        assert_eq!(db.reports().total_for_day(day(1)).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn test_totals_and_top_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let base = db
            .catalog()
            .insert(&NewCatalogItem::new("Base Líquida", 10, Money::from_cents(10_000)))
            .await
            .unwrap();
        let crema = db
            .catalog()
            .insert(&NewCatalogItem::new("Crema", 10, Money::from_cents(5_000)))
            .await
            .unwrap();

        for (d, product, qty) in [(1, &crema, 3), (1, &base, 1), (15, &crema, 1)] {
            let mut cart = Cart::new();
            cart.add_item(product).unwrap();
            cart.set_quantity(product.id, qty);
            let header = SaleHeader {
                date: day(d),
                client_name: "Ana".to_string(),
                payment_kind: PaymentKind::Installment,
            };
            db.sales().create_from_cart(&header, &cart).await.unwrap();
        }

        let reports = db.reports();
        assert_eq!(reports.total_for_day(day(1)).await.unwrap(), Money::from_cents(25_000));
        assert_eq!(
            reports.total_between(day(1), day(31)).await.unwrap(),
            Money::from_cents(30_000)
        );
        assert_eq!(reports.total_between(day(2), day(14)).await.unwrap(), Money::zero());

        let top = reports.top_products(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Crema");
        assert_eq!(top[0].units, 4);
        assert_eq!(top[0].revenue, Money::from_cents(20_000));
        assert_eq!(top[1].name, "Base Líquida");

        assert_eq!(reports.top_products(1).await.unwrap().len(), 1);
    }
}
