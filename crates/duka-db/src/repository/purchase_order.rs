//! # Purchase Order Repository
//!
//! ```text
//!            create()
//!               │
//!               ▼
//!          ┌─────────┐   receive()   ┌──────────┐
//!          │ Pending │──────────────►│ Received │  stock += qty, purchase logs
//!          └────┬────┘               └──────────┘
//!               │ cancel()
//!               ▼
//!          ┌───────────┐
//!          │ Cancelled │
//!          └───────────┘
//! ```
//!
//! Any other transition fails with `InvalidStatus`.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{apply_delta, insert_log, LogEntry};
use crate::repository::new_id;
use crate::repository::sale::{ensure_exists, fetch_product};
use duka_core::validation::{
    validate_amount_cents, validate_date_range, validate_line_count, validate_quantity,
};
use duka_core::{
    CoreError, LogType, Money, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
    ValidationError,
};

const SELECT_ORDER: &str = r#"
    SELECT
        id, supplier_id, staff_id, order_date, expected_delivery_date,
        status, total_cost_cents, invoice_no
    FROM purchase_order
"#;

/// One product line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: String,
    pub quantity_ordered: i64,
    pub unit_cost_cents: i64,
}

impl OrderLineInput {
    pub fn sub_total(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity_ordered)
    }
}

/// A purchase order to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub supplier_id: String,
    pub staff_id: String,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub invoice_no: Option<String>,
    pub lines: Vec<OrderLineInput>,
}

impl NewPurchaseOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_line_count(self.lines.len())?;
        for line in &self.lines {
            validate_quantity(line.quantity_ordered)?;
            validate_amount_cents("unit_cost", line.unit_cost_cents)?;
        }
        if let Some(expected) = self.expected_delivery_date {
            validate_date_range("order_date", self.order_date, "expected_delivery_date", expected)?;
        }
        Ok(())
    }
}

/// Repository for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// Creates a pending order with its lines; total_cost = Σ line sub_totals.
    pub async fn create(&self, order: NewPurchaseOrder) -> DbResult<PurchaseOrder> {
        order.validate()?;

        let total_cost: Money = order.lines.iter().map(OrderLineInput::sub_total).sum();
        let stored = PurchaseOrder {
            id: new_id(),
            supplier_id: order.supplier_id.clone(),
            staff_id: order.staff_id.clone(),
            order_date: order.order_date,
            expected_delivery_date: order.expected_delivery_date,
            status: PurchaseOrderStatus::Pending,
            total_cost_cents: total_cost.cents(),
            invoice_no: order.invoice_no.clone(),
        };

        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "supplier", "Supplier", &stored.supplier_id).await?;
        ensure_exists(&mut tx, "staff", "Staff", &stored.staff_id).await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_order (
                id, supplier_id, staff_id, order_date, expected_delivery_date,
                status, total_cost_cents, invoice_no
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.supplier_id)
        .bind(&stored.staff_id)
        .bind(stored.order_date)
        .bind(stored.expected_delivery_date)
        .bind(stored.status)
        .bind(stored.total_cost_cents)
        .bind(&stored.invoice_no)
        .execute(&mut *tx)
        .await?;

        for line in &order.lines {
            ensure_exists(&mut tx, "product", "Product", &line.product_id).await?;

            sqlx::query(
                r#"
                INSERT INTO purchase_order_line (
                    id, order_id, product_id, quantity_ordered, unit_cost_cents, sub_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(new_id())
            .bind(&stored.id)
            .bind(&line.product_id)
            .bind(line.quantity_ordered)
            .bind(line.unit_cost_cents)
            .bind(line.sub_total().cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %stored.id,
            supplier_id = %stored.supplier_id,
            lines = order.lines.len(),
            total_cost = %total_cost,
            "Purchase order created"
        );

        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let order = sqlx::query_as::<_, PurchaseOrder>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<PurchaseOrderLine>> {
        let mut conn = self.pool.acquire().await?;
        order_lines(&mut conn, order_id).await
    }

    /// Orders, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<PurchaseOrderStatus>) -> DbResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "{SELECT_ORDER} WHERE (?1 IS NULL OR status = ?1) ORDER BY order_date DESC, id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Receives a pending order: stock and purchase logs for every line.
    pub async fn receive(&self, order_id: &str, staff_id: &str) -> DbResult<PurchaseOrder> {
        let mut tx = self.pool.begin().await?;

        let mut order = pending_order(&mut tx, order_id).await?;
        ensure_exists(&mut tx, "staff", "Staff", staff_id).await?;

        let lines = order_lines(&mut tx, order_id).await?;
        let remarks = match &order.invoice_no {
            Some(invoice) => format!("Purchase order {order_id} (invoice {invoice})"),
            None => format!("Purchase order {order_id}"),
        };
        let logged_at = Utc::now();

        for line in &lines {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| DbError::unknown("Product", &line.product_id))?;

            apply_delta(&mut tx, &product, line.quantity_ordered).await?;
            insert_log(
                &mut tx,
                LogEntry {
                    staff_id,
                    product_id: &line.product_id,
                    log_type: LogType::Purchase,
                    quantity: line.quantity_ordered,
                    logged_at,
                    remarks: Some(&remarks),
                    adjustment_reason: None,
                    unit_cost_cents: None,
                },
            )
            .await?;
        }

        set_status(&mut tx, order_id, PurchaseOrderStatus::Received).await?;
        tx.commit().await?;

        order.status = PurchaseOrderStatus::Received;
        info!(order_id = %order_id, lines = lines.len(), "Purchase order received");

        Ok(order)
    }

    /// Cancels a pending order.
    pub async fn cancel(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        pending_order(&mut tx, order_id).await?;
        set_status(&mut tx, order_id, PurchaseOrderStatus::Cancelled).await?;

        tx.commit().await?;

        info!(order_id = %order_id, "Purchase order cancelled");
        Ok(())
    }
}

async fn pending_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<PurchaseOrder> {
    let order = sqlx::query_as::<_, PurchaseOrder>(&format!("{SELECT_ORDER} WHERE id = ?1"))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("PurchaseOrder", order_id))?;

    if order.status != PurchaseOrderStatus::Pending {
        warn!(order_id = %order_id, status = order.status.as_str(), "Order is not pending");
        return Err(CoreError::InvalidStatus {
            entity: "PurchaseOrder".to_string(),
            id: order_id.to_string(),
            status: order.status.as_str().to_string(),
        }
        .into());
    }

    Ok(order)
}

async fn order_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<PurchaseOrderLine>> {
    let lines = sqlx::query_as::<_, PurchaseOrderLine>(
        r#"
        SELECT id, order_id, product_id, quantity_ordered, unit_cost_cents, sub_total_cents
        FROM purchase_order_line
        WHERE order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

async fn set_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: PurchaseOrderStatus,
) -> DbResult<()> {
    debug!(order_id = %order_id, status = status.as_str(), "Updating order status");

    sqlx::query("UPDATE purchase_order SET status = ?2 WHERE id = ?1")
        .bind(order_id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, today};

    fn order_for(supplier_id: &str, staff_id: &str, product_id: &str) -> NewPurchaseOrder {
        NewPurchaseOrder {
            supplier_id: supplier_id.to_string(),
            staff_id: staff_id.to_string(),
            order_date: today(),
            expected_delivery_date: None,
            invoice_no: Some("INV-0042".to_string()),
            lines: vec![OrderLineInput {
                product_id: product_id.to_string(),
                quantity_ordered: 24,
                unit_cost_cents: 12_500,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_and_receive() {
        let fx = fixture().await;
        let oil = fx.product("Elianto Corn Oil 1L", 2, 12_500, None).await;
        let repo = fx.db.purchase_orders();

        let order = repo
            .create(order_for(&fx.supplier.id, &fx.cashier.id, &oil.id))
            .await
            .unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Pending);
        assert_eq!(order.total_cost_cents, 300_000);
        assert_eq!(repo.get_lines(&order.id).await.unwrap().len(), 1);

        let received = repo.receive(&order.id, &fx.cashier.id).await.unwrap();
        assert_eq!(received.status, PurchaseOrderStatus::Received);

        let after = fx.db.products().get_by_id(&oil.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 26);

        let logs = fx.db.inventory().logs_for_product(&oil.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].log_type, LogType::Purchase);
        assert_eq!(logs[0].quantity, 24);

        let err = repo.receive(&order.id, &fx.cashier.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStatus { .. })));
        let err = repo.cancel(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let fx = fixture().await;
        let oil = fx.product("Elianto Corn Oil 1L", 2, 12_500, None).await;
        let repo = fx.db.purchase_orders();

        let order = repo
            .create(order_for(&fx.supplier.id, &fx.cashier.id, &oil.id))
            .await
            .unwrap();
        repo.cancel(&order.id).await.unwrap();

        let cancelled = repo.list(Some(PurchaseOrderStatus::Cancelled)).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert!(repo.list(Some(PurchaseOrderStatus::Pending)).await.unwrap().is_empty());

        let after = fx.db.products().get_by_id(&oil.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_product() {
        let fx = fixture().await;
        let err = fx
            .db
            .purchase_orders()
            .create(order_for(&fx.supplier.id, &fx.cashier.id, "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnknownReference { .. })));
        assert!(fx.db.purchase_orders().list(None).await.unwrap().is_empty());
    }
}
