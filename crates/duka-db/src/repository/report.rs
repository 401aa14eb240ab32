//! # Report Repository
//!
//! Read-only aggregates for the back office. Reports run outside the engine
//! transactions and may lag a concurrent sale by one commit.
//!
//! ```text
//! sale ─────────────► sales_by_year, kpi_summary
//! sale_line ─► product ─► category ─► sales_by_category
//! inventory_log (adjustment, expiry_write_off) ─► product ─► expiry_losses
//! product ──────────► low_stock, expiring_within
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::day_bounds;
use crate::repository::product::ProductRepository;
use duka_core::{Money, Product};

/// Revenue for one calendar year (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct YearTotal {
    pub year: i64,
    pub total_cents: i64,
}

/// Line revenue per category, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category_id: String,
    pub category_name: String,
    pub total_cents: i64,
}

/// Headline figures for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesKpi {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue_cents: i64,
    pub sale_count: i64,
    pub average_basket_cents: i64,
    pub discounts_given_cents: i64,
}

impl SalesKpi {
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }

    pub fn average_basket(&self) -> Money {
        Money::from_cents(self.average_basket_cents)
    }
}

#[derive(sqlx::FromRow)]
struct KpiRow {
    revenue_cents: i64,
    sale_count: i64,
    discounts_given_cents: i64,
}

/// One expiry write-off, valued at the product's current unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExpiryLoss {
    pub log_id: String,
    pub product_id: String,
    pub product_name: String,
    pub logged_at: DateTime<Utc>,
    /// Units written off (positive).
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub loss_cents: i64,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn sales_by_year(&self) -> DbResult<Vec<YearTotal>> {
        let rows = sqlx::query_as::<_, YearTotal>(
            r#"
            SELECT
                CAST(substr(sale_datetime, 1, 4) AS INTEGER) AS year,
                SUM(total_cents) AS total_cents
            FROM sale
            GROUP BY year
            ORDER BY year
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn sales_by_category(&self) -> DbResult<Vec<CategoryTotal>> {
        let rows = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT
                c.id AS category_id,
                c.name AS category_name,
                SUM(l.sub_total_cents) AS total_cents
            FROM sale_line l
            JOIN product p ON p.id = l.product_id
            JOIN category c ON c.id = p.category_id
            GROUP BY c.id, c.name
            ORDER BY total_cents DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Revenue, sale count, average basket and discounts for `from..=to`.
    pub async fn kpi_summary(&self, from: NaiveDate, to: NaiveDate) -> DbResult<SalesKpi> {
        let (start, end) = day_bounds(from, to);
        debug!(from = %from, to = %to, "Computing sales KPIs");

        let row = sqlx::query_as::<_, KpiRow>(
            r#"
            SELECT
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COUNT(*) AS sale_count,
                COALESCE(SUM(discount_applied_cents), 0) AS discounts_given_cents
            FROM sale
            WHERE sale_datetime >= ?1 AND sale_datetime < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let average_basket = if row.sale_count > 0 {
            Money::from_cents(row.revenue_cents).ratio(1, row.sale_count)
        } else {
            Money::zero()
        };

        Ok(SalesKpi {
            from,
            to,
            revenue_cents: row.revenue_cents,
            sale_count: row.sale_count,
            average_basket_cents: average_basket.cents(),
            discounts_given_cents: row.discounts_given_cents,
        })
    }

    /// Expiry write-offs logged in `from..=to`, oldest first.
    ///
    /// Valued at the unit cost stored on the log row when the batch ran.
    pub async fn expiry_losses(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<ExpiryLoss>> {
        let (start, end) = day_bounds(from, to);

        let rows = sqlx::query_as::<_, ExpiryLoss>(
            r#"
            SELECT
                l.id AS log_id,
                p.id AS product_id,
                p.name AS product_name,
                l.logged_at AS logged_at,
                -l.quantity AS quantity,
                l.unit_cost_cents AS unit_cost_cents,
                -l.quantity * l.unit_cost_cents AS loss_cents
            FROM inventory_log l
            JOIN product p ON p.id = l.product_id
            WHERE l.log_type = 'adjustment'
              AND l.adjustment_reason = 'expiry_write_off'
              AND l.logged_at >= ?1 AND l.logged_at < ?2
            ORDER BY l.logged_at, p.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Products at or below their reorder level.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        ProductRepository::new(self.pool.clone()).low_stock().await
    }

    /// Products with stock expiring within `days` days of `as_of`.
    pub async fn expiring_within(&self, as_of: NaiveDate, days: u64) -> DbResult<Vec<Product>> {
        ProductRepository::new(self.pool.clone())
            .expiring_within(as_of, days)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;
    use crate::repository::inventory::MovementRequest;
    use crate::repository::sale::SaleRequest;
    use crate::test_support::{fixture, today};
    use duka_core::{LogType, PaymentMethod, SaleLineInput};

    #[tokio::test]
    async fn test_sales_aggregates() {
        let fx = fixture().await;
        let bread = fx.product("Festive White Bread 400g", 50, 3_000, None).await;

        for (receipt, qty) in [("R-1", 2), ("R-2", 3)] {
            let line = SaleLineInput::new(&bread.id, qty, bread.retail_price());
            fx.db
                .sales()
                .record_sale(SaleRequest::new(
                    &fx.cashier.id,
                    PaymentMethod::Cash,
                    receipt,
                    vec![line],
                ))
                .await
                .unwrap();
        }

        let years = fx.db.reports().sales_by_year().await.unwrap();
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].year, i64::from(today().year()));
        assert_eq!(years[0].total_cents, 30_000);

        let categories = fx.db.reports().sales_by_category().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category_id, fx.category.id);
        assert_eq!(categories[0].total_cents, 30_000);

        let kpi = fx.db.reports().kpi_summary(today(), today()).await.unwrap();
        assert_eq!(kpi.sale_count, 2);
        assert_eq!(kpi.revenue_cents, 30_000);
        assert_eq!(kpi.average_basket_cents, 15_000);
        assert_eq!(kpi.discounts_given_cents, 0);
    }

    #[tokio::test]
    async fn test_kpi_for_empty_range() {
        let fx = fixture().await;
        let kpi = fx.db.reports().kpi_summary(today(), today()).await.unwrap();
        assert_eq!(kpi.sale_count, 0);
        assert_eq!(kpi.average_basket(), Money::zero());
    }

    #[tokio::test]
    async fn test_expiry_losses_ignore_manual_adjustments() {
        let fx = fixture().await;
        let yesterday = today().pred_opt().unwrap();
        let yoghurt = fx.product("Yoghurt 500ml", 10, 200, Some(yesterday)).await;
        let sugar = fx.product("Sugar 2kg", 10, 500, None).await;

        fx.db
            .inventory()
            .record_movement(MovementRequest {
                staff_id: fx.cashier.id.clone(),
                product_id: sugar.id.clone(),
                log_type: LogType::Adjustment,
                quantity: -1,
                remarks: Some("torn bag".to_string()),
            })
            .await
            .unwrap();
        fx.db
            .inventory()
            .write_off_expired(today(), &fx.system.id)
            .await
            .unwrap();

        let losses = fx.db.reports().expiry_losses(today(), today()).await.unwrap();
        assert_eq!(losses.len(), 1);
        assert_eq!(losses[0].product_id, yoghurt.id);
        assert_eq!(losses[0].quantity, 10);
        assert_eq!(losses[0].loss_cents, 2_000);
    }

    #[tokio::test]
    async fn test_expiry_losses_keep_cost_at_write_off() {
        let fx = fixture().await;
        let yesterday = today().pred_opt().unwrap();
        let yoghurt = fx.product("Yoghurt 500ml", 10, 200, Some(yesterday)).await;

        let summary = fx
            .db
            .inventory()
            .write_off_expired(today(), &fx.system.id)
            .await
            .unwrap();
        assert_eq!(summary.total_loss(), Money::from_cents(2_000));

        let mut repriced = fx.db.products().get_by_id(&yoghurt.id).await.unwrap().unwrap();
        repriced.unit_cost_cents = 500;
        fx.db.products().update(&repriced).await.unwrap();

        let losses = fx.db.reports().expiry_losses(today(), today()).await.unwrap();
        assert_eq!(losses.len(), 1);
        assert_eq!(losses[0].unit_cost_cents, 200);
        assert_eq!(losses[0].loss_cents, summary.total_loss_cents);

        let logs = fx.db.inventory().logs_for_product(&yoghurt.id).await.unwrap();
        assert_eq!(logs[0].unit_cost_cents, Some(200));
    }
}
