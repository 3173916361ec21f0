//! # Catalog Repository
//!
//! Products, categories and stock levels.
//!
//! Ranking is not done here: callers load [`list_active`] once and hand it to
//! `stockline_core::search`, which runs on every keystroke without touching
//! the database.
//!
//! [`list_active`]: CatalogRepository::list_active

use sqlx::{FromRow, SqlitePool};
use stockline_core::validation::{
    validate_category_name, validate_price_cents, validate_product_name, validate_stock,
};
use stockline_core::{CatalogItem, Category, Money};
use tracing::{debug, info};

use super::adjust_stock;
use crate::error::{DbError, DbResult};

/// Row shape of `products`.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category_id: Option<i64>,
    stock: i64,
    price_cents: i64,
}

impl From<ProductRow> for CatalogItem {
    fn from(row: ProductRow) -> Self {
        CatalogItem {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            stock: row.stock,
            unit_price: Money::from_cents(row.price_cents),
        }
    }
}

/// Fields for a product that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogItem {
    pub name: String,
    pub category_id: Option<i64>,
    pub stock: i64,
    pub unit_price: Money,
}

impl NewCatalogItem {
    pub fn new(name: impl Into<String>, stock: i64, unit_price: Money) -> Self {
        NewCatalogItem {
            name: name.into(),
            category_id: None,
            stock,
            unit_price,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Lists every active product, ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<CatalogItem>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, category_id, stock, price_cents
            FROM products
            WHERE is_active = 1
            ORDER BY name COLLATE NOCASE, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded active catalog");
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<CatalogItem>> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, category_id, stock, price_cents
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogItem::from))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(CatalogItem)` - Inserted product with its generated id
    /// * `Err(DbError::Core)` - Name, price or stock failed validation
    pub async fn insert(&self, item: &NewCatalogItem) -> DbResult<CatalogItem> {
        let name = validate_product_name(&item.name)?;
        validate_price_cents(item.unit_price.cents())?;
        validate_stock(item.stock)?;

        debug!(name = %name, "Inserting product");

        let id = sqlx::query(
            r#"
            INSERT INTO products (name, category_id, stock, price_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&name)
        .bind(item.category_id)
        .bind(item.stock)
        .bind(item.unit_price.cents())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(CatalogItem {
            id,
            name,
            category_id: item.category_id,
            stock: item.stock,
            unit_price: item.unit_price,
        })
    }

    /// Updates a product's name, category and price.
    ///
    /// `item.stock` is ignored; stock only moves through [`update_stock`]
    /// so concurrent sales are never overwritten. Existing sale lines keep
    /// the name and price they were sold under.
    ///
    /// [`update_stock`]: CatalogRepository::update_stock
    pub async fn update(&self, item: &CatalogItem) -> DbResult<()> {
        let name = validate_product_name(&item.name)?;
        validate_price_cents(item.unit_price.cents())?;

        debug!(id = item.id, name = %name, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category_id = ?3,
                price_cents = ?4,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(item.id)
        .bind(&name)
        .bind(item.category_id)
        .bind(item.unit_price.cents())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", item.id));
        }

        Ok(())
    }

    /// Changes a product's stock by `delta`.
    ///
    /// ## Returns
    /// * `Ok(new_stock)`
    /// * `Err(DbError::InsufficientStock)` - the result would be negative
    /// * `Err(DbError::NotFound)` - no such product
    pub async fn update_stock(&self, id: i64, delta: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let stock = adjust_stock(&mut conn, id, delta).await?;
        info!(product_id = id, delta, stock, "Stock updated");
        Ok(stock)
    }

    /// Active products at or below `threshold` units, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<CatalogItem>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, category_id, stock, price_cents
            FROM products
            WHERE is_active = 1 AND stock <= ?1
            ORDER BY stock, name COLLATE NOCASE
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    /// Hides a product from the catalog.
    ///
    /// Historical sale lines keep referencing it, so rows are never deleted.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deactivating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Inserts a category; names are unique.
    pub async fn insert_category(&self, name: &str) -> DbResult<Category> {
        let name = validate_category_name(name)?;

        let id = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(&name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Category { id, name })
    }

    /// Renames a category.
    pub async fn update_category(&self, category: &Category) -> DbResult<()> {
        let name = validate_category_name(&category.name)?;

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(category.id)
            .bind(&name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category.id));
        }

        Ok(())
    }

    /// Deletes a category. Its products stay in the catalog, uncategorized.
    pub async fn delete_category(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Lists categories by name.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id, name })
            .collect())
    }
}
