//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Who changes stock_quantity?                                           │
//! │                                                                         │
//! │  ProductRepository::insert ──────► opening stock only                  │
//! │  ProductRepository::update ──────► never (catalog fields only)         │
//! │                                                                         │
//! │  SaleRepository::record_sale ────► −qty   + InventoryLog (sale)        │
//! │  InventoryRepository::*      ────► ±qty   + InventoryLog               │
//! │  PurchaseOrderRepository::receive ► +qty  + InventoryLog (purchase)    │
//! │                                                                         │
//! │  Every change after creation is paired with a log row in the same      │
//! │  transaction. CHECK (stock_quantity >= 0) backs the guarded UPDATEs.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::{validate_amount_cents, validate_required, validate_stock_count};
use duka_core::Product;

pub(crate) const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, brand, unit,
        unit_cost_cents, retail_price_cents, stock_quantity,
        expiry_date, reorder_level, batch_number,
        category_id, supplier_id
    FROM product
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let results = repo.search("milk", 20).await?;
/// let low = repo.low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches products by name or brand (case-insensitive substring).
    ///
    /// An empty query lists products alphabetically.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE name LIKE ?1 ESCAPE '\' OR brand LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2"#
        ))
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search complete");
        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE category_id = ?1 ORDER BY name"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products at or below their reorder level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE stock_quantity <= reorder_level ORDER BY stock_quantity, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products with stock that expire within `days` days of `as_of`
    /// (`as_of ≤ expiry_date ≤ as_of + days`), soonest first.
    pub async fn expiring_within(&self, as_of: NaiveDate, days: u64) -> DbResult<Vec<Product>> {
        let until = as_of.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE expiry_date IS NOT NULL
              AND expiry_date >= ?1 AND expiry_date <= ?2
              AND stock_quantity > 0
            ORDER BY expiry_date, name"#
        ))
        .bind(as_of)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products that expired strictly before `as_of` and still have stock.
    pub async fn expired_with_stock(&self, as_of: NaiveDate) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE expiry_date IS NOT NULL AND expiry_date < ?1 AND stock_quantity > 0
            ORDER BY expiry_date, name"#
        ))
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product with its opening stock.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        let stored = Product {
            id: id_or_new(&product.id),
            name: validate_required("name", &product.name, 200)?,
            unit: validate_required("unit", &product.unit, 20)?,
            ..product.clone()
        };
        validate_amount_cents("unit_cost", stored.unit_cost_cents)?;
        validate_amount_cents("retail_price", stored.retail_price_cents)?;
        validate_stock_count("stock_quantity", stored.stock_quantity)?;
        validate_stock_count("reorder_level", stored.reorder_level)?;

        debug!(id = %stored.id, name = %stored.name, stock = stored.stock_quantity, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO product (
                id, name, brand, unit,
                unit_cost_cents, retail_price_cents, stock_quantity,
                expiry_date, reorder_level, batch_number,
                category_id, supplier_id
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12
            )
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.name)
        .bind(&stored.brand)
        .bind(&stored.unit)
        .bind(stored.unit_cost_cents)
        .bind(stored.retail_price_cents)
        .bind(stored.stock_quantity)
        .bind(stored.expiry_date)
        .bind(stored.reorder_level)
        .bind(&stored.batch_number)
        .bind(&stored.category_id)
        .bind(&stored.supplier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_foreign_key_violation() => DbError::unknown(
                "Category or Supplier",
                format!("{} / {}", stored.category_id, stored.supplier_id),
            ),
            err => err,
        })?;

        Ok(stored)
    }

    /// Updates catalog fields. `stock_quantity` is ignored; stock moves only
    /// through logged operations.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let name = validate_required("name", &product.name, 200)?;
        let unit = validate_required("unit", &product.unit, 20)?;
        validate_amount_cents("unit_cost", product.unit_cost_cents)?;
        validate_amount_cents("retail_price", product.retail_price_cents)?;
        validate_stock_count("reorder_level", product.reorder_level)?;

        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE product SET
                name = ?2,
                brand = ?3,
                unit = ?4,
                unit_cost_cents = ?5,
                retail_price_cents = ?6,
                expiry_date = ?7,
                reorder_level = ?8,
                batch_number = ?9,
                category_id = ?10,
                supplier_id = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&name)
        .bind(&product.brand)
        .bind(&unit)
        .bind(product.unit_cost_cents)
        .bind(product.retail_price_cents)
        .bind(product.expiry_date)
        .bind(product.reorder_level)
        .bind(&product.batch_number)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product that no sale line, log or order references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM product WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Product", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
