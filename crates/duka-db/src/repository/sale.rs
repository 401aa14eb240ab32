//! # Sale Repository
//!
//! The sale transaction engine: records a checkout atomically.
//!
//! ## record_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One SQLite transaction                               │
//! │                                                                         │
//! │  0. staff / customer exist?          no ──► UnknownReference            │
//! │  1. per product (lines summed):                                         │
//! │        stock ≥ requested?            no ──► InsufficientStock           │
//! │  2. INSERT sale (total 0)       UNIQUE(receipt_no) ──► DuplicateReceipt │
//! │  3. per line:                                                           │
//! │        INSERT sale_line (unit price snapshot, sub_total)                │
//! │        UPDATE product SET stock −= qty WHERE stock ≥ qty  (CAS)         │
//! │        INSERT inventory_log (sale, −qty)                                │
//! │  4. Σ sub_total                                                         │
//! │  5. resolve_discount(Σ, sale date, active discounts)                    │
//! │        INSERT sale_discount per applied discount                        │
//! │  6. UPDATE sale SET total, discount_applied                             │
//! │                                                                         │
//! │  COMMIT ── any error before this point drops the transaction and       │
//! │            rolls back every write above                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Postcondition: `Σ sub_total − discount_applied = total`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::discount::list_active_on;
use crate::repository::inventory::{insert_log, LogEntry};
use crate::repository::product::SELECT_PRODUCT;
use crate::repository::{day_bounds, new_id};
use duka_core::sale::{lines_total, requested_quantities, validate_lines};
use duka_core::validation::validate_receipt_no;
use duka_core::{
    resolve_discount, CoreError, LogType, PaymentMethod, Product, Sale, SaleDiscount,
    SaleLine, SaleLineInput, StackingOrder,
};

const SELECT_SALE: &str = r#"
    SELECT
        id, customer_id, staff_id, discount_id, sale_datetime,
        total_cents, payment_method, discount_applied_cents, receipt_no
    FROM sale
"#;

/// Everything needed to record one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub customer_id: Option<String>,
    pub staff_id: String,
    pub payment_method: PaymentMethod,
    pub receipt_no: String,
    pub lines: Vec<SaleLineInput>,
    /// Defaults to now. Its calendar date (UTC) selects the discounts.
    pub sold_at: Option<DateTime<Utc>>,
}

impl SaleRequest {
    pub fn new(
        staff_id: impl Into<String>,
        payment_method: PaymentMethod,
        receipt_no: impl Into<String>,
        lines: Vec<SaleLineInput>,
    ) -> Self {
        SaleRequest {
            customer_id: None,
            staff_id: staff_id.into(),
            payment_method,
            receipt_no: receipt_no.into(),
            lines,
            sold_at: None,
        }
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn sold_at(mut self, sold_at: DateTime<Utc>) -> Self {
        self.sold_at = Some(sold_at);
        self
    }
}

/// Repository for sales and the checkout engine.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    stacking_order: StackingOrder,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, stacking_order: StackingOrder) -> Self {
        SaleRepository {
            pool,
            stacking_order,
        }
    }

    /// Records a sale atomically. See the module docs for the steps.
    ///
    /// ## Errors
    /// - `InsufficientStock` when any product lacks stock (nothing written)
    /// - `DuplicateReceipt` when the receipt number is taken
    /// - `UnknownReference` for a missing staff, customer or product
    /// - `Validation` for empty lines, bad quantities or prices (including
    ///   prices above `MAX_AMOUNT_CENTS`)
    pub async fn record_sale(&self, request: SaleRequest) -> DbResult<Sale> {
        validate_receipt_no(&request.receipt_no)?;
        validate_lines(&request.lines)?;

        let receipt_no = request.receipt_no.trim().to_string();
        let sold_at = request.sold_at.unwrap_or_else(Utc::now);
        let sale_date = sold_at.date_naive();

        debug!(
            receipt_no = %receipt_no,
            staff_id = %request.staff_id,
            lines = request.lines.len(),
            "Recording sale"
        );

        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "staff", "Staff", &request.staff_id).await?;
        if let Some(customer_id) = &request.customer_id {
            ensure_exists(&mut tx, "customer", "Customer", customer_id).await?;
        }

        // Step 1: stock check per product, all lines for a product together.
        let mut products: HashMap<String, Product> = HashMap::new();
        for (product_id, requested) in requested_quantities(&request.lines) {
            let product = fetch_product(&mut tx, &product_id)
                .await?
                .ok_or_else(|| DbError::unknown("Product", &product_id))?;

            if !product.can_sell(requested) {
                warn!(
                    receipt_no = %receipt_no,
                    product_id = %product.id,
                    requested = requested,
                    available = product.stock_quantity,
                    "Sale rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    product: product.name.clone(),
                    requested,
                    available: product.stock_quantity,
                }
                .into());
            }
            products.insert(product_id, product);
        }

        // Step 2: the sale row, total filled in at step 6.
        let sale_id = new_id();
        sqlx::query(
            r#"
            INSERT INTO sale (
                id, customer_id, staff_id, discount_id, sale_datetime,
                total_cents, payment_method, discount_applied_cents, receipt_no
            ) VALUES (?1, ?2, ?3, NULL, ?4, 0, ?5, NULL, ?6)
            "#,
        )
        .bind(&sale_id)
        .bind(&request.customer_id)
        .bind(&request.staff_id)
        .bind(sold_at)
        .bind(request.payment_method)
        .bind(&receipt_no)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("sale.receipt_no") => {
                warn!(receipt_no = %receipt_no, "Sale rejected: duplicate receipt");
                DbError::Domain(CoreError::DuplicateReceipt(receipt_no.clone()))
            }
            err => err,
        })?;

        // Step 3: lines, guarded stock decrement, audit log.
        for (line_no, line) in request.lines.iter().enumerate() {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| DbError::unknown("Product", &line.product_id))?;

            sqlx::query(
                r#"
                INSERT INTO sale_line (
                    id, sale_id, line_no, product_id, quantity_sold,
                    unit_price_cents, discount_value_cents, sub_total_cents, batch_number
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(new_id())
            .bind(&sale_id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.discount_value_cents)
            .bind(line.sub_total().cents())
            .bind(&product.batch_number)
            .execute(&mut *tx)
            .await?;

            let decremented = sqlx::query(
                r#"
                UPDATE product
                SET stock_quantity = stock_quantity - ?2
                WHERE id = ?1 AND stock_quantity >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available = fetch_product(&mut tx, &line.product_id)
                    .await?
                    .map(|p| p.stock_quantity)
                    .unwrap_or(0);
                warn!(
                    receipt_no = %receipt_no,
                    product_id = %line.product_id,
                    available = available,
                    "Sale rejected: stock changed during checkout"
                );
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    product: product.name.clone(),
                    requested: line.quantity,
                    available,
                }
                .into());
            }

            let remarks = match &product.batch_number {
                Some(batch) => format!("Sale {receipt_no} (batch {batch})"),
                None => format!("Sale {receipt_no}"),
            };
            insert_log(
                &mut tx,
                LogEntry {
                    staff_id: &request.staff_id,
                    product_id: &line.product_id,
                    log_type: LogType::Sale,
                    quantity: -line.quantity,
                    logged_at: sold_at,
                    remarks: Some(&remarks),
                    adjustment_reason: None,
                    unit_cost_cents: None,
                },
            )
            .await?;
        }

        // Steps 4-5: subtotal and store-wide discount.
        let lines_sum = lines_total(&request.lines)?;
        let active = list_active_on(&mut *tx, sale_date).await?;
        let resolution = resolve_discount(lines_sum, sale_date, &active, self.stacking_order);

        for applied in &resolution.applied {
            sqlx::query(
                "INSERT INTO sale_discount (sale_id, discount_id, amount_cents) VALUES (?1, ?2, ?3)",
            )
            .bind(&sale_id)
            .bind(&applied.discount_id)
            .bind(applied.amount_cents)
            .execute(&mut *tx)
            .await?;
        }

        let total = resolution.apply_to(lines_sum);
        let discount_applied_cents = if resolution.amount.is_zero() {
            None
        } else {
            Some(resolution.amount.cents())
        };
        let discount_id = resolution.primary_discount_id().map(str::to_string);

        // Step 6: final total.
        sqlx::query(
            r#"
            UPDATE sale SET
                total_cents = ?2,
                discount_applied_cents = ?3,
                discount_id = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&sale_id)
        .bind(total.cents())
        .bind(discount_applied_cents)
        .bind(&discount_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            receipt_no = %receipt_no,
            lines = request.lines.len(),
            subtotal = %lines_sum,
            discount = %resolution.amount,
            total = %total,
            "Sale recorded"
        );

        Ok(Sale {
            id: sale_id,
            customer_id: request.customer_id,
            staff_id: request.staff_id,
            discount_id,
            sale_datetime: sold_at,
            total_cents: total.cents(),
            payment_method: request.payment_method,
            discount_applied_cents,
            receipt_no,
        })
    }

    /// Gets a sale by ID.
    pub async fn get_sale(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub async fn get_by_receipt(&self, receipt_no: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE receipt_no = ?1"))
            .bind(receipt_no.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in receipt order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                id, sale_id, line_no, product_id, quantity_sold,
                unit_price_cents, discount_value_cents, sub_total_cents, batch_number
            FROM sale_line
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Discounts that contributed to a sale, largest first.
    pub async fn get_discounts(&self, sale_id: &str) -> DbResult<Vec<SaleDiscount>> {
        let discounts = sqlx::query_as::<_, SaleDiscount>(
            r#"
            SELECT sale_id, discount_id, amount_cents
            FROM sale_discount
            WHERE sale_id = ?1
            ORDER BY amount_cents DESC, discount_id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    /// Sales whose date falls in `[from, to]`, oldest first.
    pub async fn list_sales(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Sale>> {
        let (start, end) = day_bounds(from, to);

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE sale_datetime >= ?1 AND sale_datetime < ?2 ORDER BY sale_datetime"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Deletes a sale with its lines and discount rows.
    ///
    /// Stock is not restored and the sale's inventory logs stay: this is an
    /// administrative correction, not a return.
    pub async fn delete_sale(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sale WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        info!(sale_id = %id, "Sale deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction helpers (shared with inventory and purchasing)
// =============================================================================

/// Fails with `UnknownReference` unless `table` has a row with `id`.
pub(crate) async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &str,
    id: &str,
) -> DbResult<()> {
    let sql = match table {
        "staff" => "SELECT COUNT(*) FROM staff WHERE id = ?1",
        "customer" => "SELECT COUNT(*) FROM customer WHERE id = ?1",
        "supplier" => "SELECT COUNT(*) FROM supplier WHERE id = ?1",
        _ => "SELECT COUNT(*) FROM product WHERE id = ?1",
    };

    let count: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(&mut *conn).await?;
    if count == 0 {
        return Err(DbError::unknown(entity, id));
    }

    Ok(())
}

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Days, TimeZone, Utc};

    use super::*;
    use crate::test_support::{fixture, today};
    use duka_core::{DiscountType, Money};

    fn line(product: &Product, quantity: i64, unit_price: Money) -> SaleLineInput {
        SaleLineInput::new(&product.id, quantity, unit_price)
    }

    #[tokio::test]
    async fn test_record_sale_commits_everything() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;
        let bread = fx.product("Festive White Bread 400g", 4, 4_000, None).await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R10001",
            vec![
                line(&milk, 3, Money::from_major(100)),
                line(&bread, 1, Money::from_major(60)).with_discount(Money::from_major(5)),
            ],
        );
        let sale = fx.db.sales().record_sale(request).await.unwrap();

        assert_eq!(sale.total(), Money::from_major(355));
        assert!(sale.discount_applied_cents.is_none());

        let stored = fx.db.sales().get_by_receipt("R10001").await.unwrap().unwrap();
        assert_eq!(stored, sale);

        let lines = fx.db.sales().get_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, milk.id);
        assert!(lines.iter().all(SaleLine::reconciles));

        let milk_after = fx.db.products().get_by_id(&milk.id).await.unwrap().unwrap();
        assert_eq!(milk_after.stock_quantity, 7);

        let logs = fx.db.inventory().logs_for_product(&milk.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].log_type, LogType::Sale);
        assert_eq!(logs[0].quantity, -3);
        assert!(logs[0].remarks.as_deref().unwrap_or("").contains("R10001"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 5, 5_000, None).await;
        let bread = fx.product("Festive White Bread 400g", 10, 4_000, None).await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Card,
            "R20001",
            vec![
                line(&bread, 2, Money::from_major(60)),
                line(&milk, 6, Money::from_major(100)),
            ],
        );
        let err = fx.db.sales().record_sale(request).await.unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            }) => {
                assert_eq!(product_id, milk.id);
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(fx.db.sales().count().await.unwrap(), 0);
        let bread_after = fx.db.products().get_by_id(&bread.id).await.unwrap().unwrap();
        assert_eq!(bread_after.stock_quantity, 10);
        assert!(fx.db.inventory().logs_for_product(&bread.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_price_is_rejected_before_writing() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R20050",
            vec![line(&milk, 2, Money::from_cents(i64::MAX / 2 + 1))],
        );
        let err = fx.db.sales().record_sale(request).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))), "{err:?}");

        assert_eq!(fx.db.sales().count().await.unwrap(), 0);
        let after = fx.db.products().get_by_id(&milk.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_lines_for_same_product_are_checked_together() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 5, 5_000, None).await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R30001",
            vec![
                line(&milk, 3, Money::from_major(100)),
                line(&milk, 3, Money::from_major(100)),
            ],
        );
        let err = fx.db.sales().record_sale(request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { requested: 6, available: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_receipt_leaves_no_trace() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;

        let first = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R40001",
            vec![line(&milk, 2, Money::from_major(100))],
        );
        fx.db.sales().record_sale(first.clone()).await.unwrap();

        let err = fx.db.sales().record_sale(first).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateReceipt(ref r)) if r == "R40001"
        ));

        assert_eq!(fx.db.sales().count().await.unwrap(), 1);
        let milk_after = fx.db.products().get_by_id(&milk.id).await.unwrap().unwrap();
        assert_eq!(milk_after.stock_quantity, 8);
        assert_eq!(fx.db.inventory().logs_for_product(&milk.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stacked_discounts_on_large_sale() {
        let fx = fixture().await;
        let tv = fx.product("Hisense 32\" TV", 3, 2_000_000, None).await;
        let start = today() - Days::new(1);
        let end = today() + Days::new(1);
        fx.discount("Ten percent", DiscountType::Percentage, 1000, start, end).await;
        let fixed = fx
            .discount("Five thousand off", DiscountType::Fixed, 500_000, start, end)
            .await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::MobileMoney,
            "R50001",
            vec![line(&tv, 2, Money::from_major(50_000))],
        );
        let sale = fx.db.sales().record_sale(request).await.unwrap();

        assert_eq!(sale.discount_applied(), Money::from_major(15_000));
        assert_eq!(sale.total(), Money::from_major(85_000));
        assert_eq!(sale.discount_id.as_deref(), Some(fixed.id.as_str()));

        let applied = fx.db.sales().get_discounts(&sale.id).await.unwrap();
        assert_eq!(applied.len(), 2);
        let applied_sum: i64 = applied.iter().map(|d| d.amount_cents).sum();
        assert_eq!(applied_sum, sale.discount_applied().cents());

        // Σ sub_total − discount_applied = total
        let lines = fx.db.sales().get_lines(&sale.id).await.unwrap();
        let sub_totals: Money = lines.iter().map(SaleLine::sub_total).sum();
        assert_eq!(sub_totals - sale.discount_applied(), sale.total());
    }

    #[tokio::test]
    async fn test_discount_date_follows_sold_at() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;
        let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        fx.discount("Pi day", DiscountType::Percentage, 1000, day, day + Days::new(1))
            .await;

        let during = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R60001",
            vec![line(&milk, 1, Money::from_major(100))],
        )
        .sold_at(Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap());
        let sale = fx.db.sales().record_sale(during).await.unwrap();
        assert_eq!(sale.total(), Money::from_major(90));

        let after = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R60002",
            vec![line(&milk, 1, Money::from_major(100))],
        )
        .sold_at(Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap());
        let sale = fx.db.sales().record_sale(after).await.unwrap();
        assert_eq!(sale.total(), Money::from_major(100));

        let march = fx
            .db
            .sales()
            .list_sales(day, chrono::NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
            .await
            .unwrap();
        assert_eq!(march.len(), 2);
        let single_day = fx.db.sales().list_sales(day, day).await.unwrap();
        assert_eq!(single_day.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;

        let ghost_product = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R70001",
            vec![SaleLineInput::new("no-such-product", 1, Money::from_major(1))],
        );
        let err = fx.db.sales().record_sale(ghost_product).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::UnknownReference { ref entity, .. }) if entity == "Product"
        ));

        let ghost_staff = SaleRequest::new(
            "no-such-staff",
            PaymentMethod::Cash,
            "R70002",
            vec![line(&milk, 1, Money::from_major(1))],
        );
        let err = fx.db.sales().record_sale(ghost_staff).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::UnknownReference { ref entity, .. }) if entity == "Staff"
        ));

        let empty = SaleRequest::new(&fx.cashier.id, PaymentMethod::Cash, "R70003", vec![]);
        let err = fx.db.sales().record_sale(empty).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_sale_keeps_stock_and_logs() {
        let fx = fixture().await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 5_000, None).await;

        let request = SaleRequest::new(
            &fx.cashier.id,
            PaymentMethod::Cash,
            "R80001",
            vec![line(&milk, 4, Money::from_major(100))],
        );
        let sale = fx.db.sales().record_sale(request).await.unwrap();

        fx.db.sales().delete_sale(&sale.id).await.unwrap();

        assert!(fx.db.sales().get_sale(&sale.id).await.unwrap().is_none());
        assert!(fx.db.sales().get_lines(&sale.id).await.unwrap().is_empty());
        let milk_after = fx.db.products().get_by_id(&milk.id).await.unwrap().unwrap();
        assert_eq!(milk_after.stock_quantity, 6);
        assert_eq!(fx.db.inventory().logs_for_product(&milk.id).await.unwrap().len(), 1);

        let err = fx.db.sales().delete_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
