//! # Inventory Repository
//!
//! Stock movements outside checkout, the expiry write-off batch, and reads
//! of the append-only inventory log.
//!
//! ## Expiry Write-off
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  write_off_expired(as_of, staff)                                       │
//! │                                                                         │
//! │  SELECT product WHERE expiry_date < as_of AND stock > 0                │
//! │       │                                                                 │
//! │       ├── none ──► WriteOffSummary::default(), nothing written          │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  per product:                                                           │
//! │       INSERT inventory_log (adjustment, −stock, expiry_write_off)      │
//! │       UPDATE product SET stock_quantity = 0                            │
//! │       loss += stock × unit_cost                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► { products_written_off, total_loss, entries }              │
//! │                                                                         │
//! │  A second run finds no stock left and writes nothing.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::{ProductRepository, SELECT_PRODUCT};
use crate::repository::sale::{ensure_exists, fetch_product};
use crate::repository::{day_bounds, new_id};
use duka_core::validation::validate_quantity;
use duka_core::{
    AdjustmentReason, CoreError, InventoryLog, LogType, Product, ValidationError, WriteOffEntry,
    WriteOffSummary,
};

const SELECT_LOG: &str = r#"
    SELECT id, staff_id, product_id, log_type, quantity, logged_at, remarks, adjustment_reason,
           unit_cost_cents
    FROM inventory_log
"#;

const WRITE_OFF_REMARKS: &str = "expiry write-off";

/// A manual stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub staff_id: String,
    pub product_id: String,
    pub log_type: LogType,
    /// Purchase / Sale: units moved (> 0).
    /// Adjustment: signed delta (≠ 0).
    pub quantity: i64,
    pub remarks: Option<String>,
}

impl MovementRequest {
    /// Signed change to stock_quantity.
    pub fn delta(&self) -> i64 {
        match self.log_type {
            LogType::Purchase | LogType::Adjustment => self.quantity,
            LogType::Sale => -self.quantity,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self.log_type {
            LogType::Purchase | LogType::Sale => validate_quantity(self.quantity),
            LogType::Adjustment if self.quantity == 0 => Err(ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: "adjustment must change stock".to_string(),
            }),
            LogType::Adjustment => validate_quantity(self.quantity.abs()),
        }
    }
}

/// Repository for stock movements and the inventory log.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Records a manual movement: stock update and log row in one transaction.
    ///
    /// Adjustments are logged with reason `Manual`. A movement that would take
    /// stock below zero fails with `InsufficientStock`.
    pub async fn record_movement(&self, movement: MovementRequest) -> DbResult<InventoryLog> {
        movement.validate()?;
        let delta = movement.delta();
        let logged_at = Utc::now();

        debug!(
            product_id = %movement.product_id,
            log_type = movement.log_type.as_str(),
            delta = delta,
            "Recording stock movement"
        );

        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "staff", "Staff", &movement.staff_id).await?;
        let product = fetch_product(&mut tx, &movement.product_id)
            .await?
            .ok_or_else(|| DbError::unknown("Product", &movement.product_id))?;

        apply_delta(&mut tx, &product, delta).await?;

        let reason = match movement.log_type {
            LogType::Adjustment => Some(AdjustmentReason::Manual),
            _ => None,
        };
        let log = insert_log(
            &mut tx,
            LogEntry {
                staff_id: &movement.staff_id,
                product_id: &movement.product_id,
                log_type: movement.log_type,
                quantity: delta,
                logged_at,
                remarks: movement.remarks.as_deref(),
                adjustment_reason: reason,
                unit_cost_cents: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            product_id = %product.id,
            log_type = movement.log_type.as_str(),
            delta = delta,
            stock = product.stock_quantity + delta,
            "Stock movement recorded"
        );

        Ok(log)
    }

    /// Lists what `write_off_expired(as_of, ..)` would remove, without writing.
    pub async fn preview_expired(&self, as_of: NaiveDate) -> DbResult<Vec<WriteOffEntry>> {
        let products = ProductRepository::new(self.pool.clone())
            .expired_with_stock(as_of)
            .await?;

        Ok(products
            .iter()
            .filter_map(|p| WriteOffEntry::for_product(p, as_of))
            .collect())
    }

    /// Zeroes the stock of every product that expired before `as_of`.
    ///
    /// All-or-nothing. Running it twice in a row writes nothing the second time.
    pub async fn write_off_expired(
        &self,
        as_of: NaiveDate,
        staff_id: &str,
    ) -> DbResult<WriteOffSummary> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "staff", "Staff", staff_id).await?;

        let expired = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE expiry_date IS NOT NULL AND expiry_date < ?1 AND stock_quantity > 0
            ORDER BY expiry_date, name"#
        ))
        .bind(as_of)
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            info!(as_of = %as_of, "No expired products to write off");
            return Ok(WriteOffSummary::default());
        }

        debug!(as_of = %as_of, count = expired.len(), "Writing off expired products");

        let logged_at = Utc::now();
        let mut entries = Vec::with_capacity(expired.len());

        for product in &expired {
            let Some(entry) = WriteOffEntry::for_product(product, as_of) else {
                continue;
            };

            insert_log(
                &mut tx,
                LogEntry {
                    staff_id,
                    product_id: &product.id,
                    log_type: LogType::Adjustment,
                    quantity: -entry.quantity,
                    logged_at,
                    remarks: Some(WRITE_OFF_REMARKS),
                    adjustment_reason: Some(AdjustmentReason::ExpiryWriteOff),
                    unit_cost_cents: Some(entry.unit_cost_cents),
                },
            )
            .await?;

            sqlx::query("UPDATE product SET stock_quantity = 0 WHERE id = ?1")
                .bind(&product.id)
                .execute(&mut *tx)
                .await?;

            debug!(
                product_id = %entry.product_id,
                quantity = entry.quantity,
                loss = %entry.loss(),
                "Written off"
            );
            entries.push(entry);
        }

        tx.commit().await?;

        let summary = WriteOffSummary::from_entries(entries);
        info!(
            as_of = %as_of,
            products_written_off = summary.products_written_off,
            total_loss = %summary.total_loss(),
            "Expiry write-off complete"
        );

        Ok(summary)
    }

    /// Log rows for a product, oldest first.
    pub async fn logs_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryLog>> {
        let logs = sqlx::query_as::<_, InventoryLog>(&format!(
            "{SELECT_LOG} WHERE product_id = ?1 ORDER BY logged_at, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Log rows dated within `[from, to]`, optionally of one type.
    pub async fn list_logs(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        log_type: Option<LogType>,
    ) -> DbResult<Vec<InventoryLog>> {
        let (start, end) = day_bounds(from, to);

        let logs = sqlx::query_as::<_, InventoryLog>(&format!(
            r#"{SELECT_LOG}
            WHERE logged_at >= ?1 AND logged_at < ?2
              AND (?3 IS NULL OR log_type = ?3)
            ORDER BY logged_at, id"#
        ))
        .bind(start)
        .bind(end)
        .bind(log_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Applies a signed stock delta with a guarded UPDATE.
///
/// Fails with `InsufficientStock` instead of letting stock go negative.
pub(crate) async fn apply_delta(
    conn: &mut SqliteConnection,
    product: &Product,
    delta: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE product
        SET stock_quantity = stock_quantity + ?2
        WHERE id = ?1 AND stock_quantity + ?2 >= 0
        "#,
    )
    .bind(&product.id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = fetch_product(conn, &product.id)
            .await?
            .map(|p| p.stock_quantity)
            .unwrap_or(0);
        warn!(
            product_id = %product.id,
            requested = -delta,
            available = available,
            "Stock movement rejected: insufficient stock"
        );
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            product: product.name.clone(),
            requested: -delta,
            available,
        }
        .into());
    }

    Ok(())
}

/// Borrowed fields of a log row about to be appended.
pub(crate) struct LogEntry<'a> {
    pub staff_id: &'a str,
    pub product_id: &'a str,
    pub log_type: LogType,
    pub quantity: i64,
    pub logged_at: DateTime<Utc>,
    pub remarks: Option<&'a str>,
    /// Required for adjustments, must be `None` otherwise.
    pub adjustment_reason: Option<AdjustmentReason>,
    /// Set only by the expiry write-off.
    pub unit_cost_cents: Option<i64>,
}

/// Appends one inventory log row. The log has no update or delete path.
pub(crate) async fn insert_log(
    conn: &mut SqliteConnection,
    entry: LogEntry<'_>,
) -> DbResult<InventoryLog> {
    let log = InventoryLog {
        id: new_id(),
        staff_id: entry.staff_id.to_string(),
        product_id: entry.product_id.to_string(),
        log_type: entry.log_type,
        quantity: entry.quantity,
        logged_at: entry.logged_at,
        remarks: entry.remarks.map(str::to_string),
        adjustment_reason: entry.adjustment_reason,
        unit_cost_cents: entry.unit_cost_cents,
    };

    sqlx::query(
        r#"
        INSERT INTO inventory_log (
            id, staff_id, product_id, log_type, quantity, logged_at, remarks, adjustment_reason,
            unit_cost_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&log.id)
    .bind(&log.staff_id)
    .bind(&log.product_id)
    .bind(log.log_type)
    .bind(log.quantity)
    .bind(log.logged_at)
    .bind(&log.remarks)
    .bind(log.adjustment_reason)
    .bind(log.unit_cost_cents)
    .execute(&mut *conn)
    .await?;

    Ok(log)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;
    use crate::test_support::{fixture, today};
    use duka_core::Money;

    #[tokio::test]
    async fn test_write_off_zeroes_stock_and_logs_loss() {
        let fx = fixture().await;
        let yesterday = today() - Days::new(1);
        let yoghurt = fx.product("Strawberry Yoghurt 500ml", 10, 200, Some(yesterday)).await;
        let fresh = fx.product("Fresh Milk", 10, 200, Some(today())).await;

        let preview = fx.db.inventory().preview_expired(today()).await.unwrap();
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].loss(), Money::from_major(20));

        let summary = fx
            .db
            .inventory()
            .write_off_expired(today(), &fx.system.id)
            .await
            .unwrap();
        assert_eq!(summary.products_written_off, 1);
        assert_eq!(summary.total_loss(), Money::from_major(20));

        let after = fx.db.products().get_by_id(&yoghurt.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);

        let logs = fx.db.inventory().logs_for_product(&yoghurt.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].log_type, LogType::Adjustment);
        assert_eq!(logs[0].quantity, -10);
        assert_eq!(logs[0].adjustment_reason, Some(AdjustmentReason::ExpiryWriteOff));
        assert_eq!(logs[0].staff_id, fx.system.id);

        // Expiring today is still sellable.
        let fresh_after = fx.db.products().get_by_id(&fresh.id).await.unwrap().unwrap();
        assert_eq!(fresh_after.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_write_off_twice_is_a_no_op() {
        let fx = fixture().await;
        let last_week = today() - Days::new(7);
        let bread = fx.product("Festive White Bread 400g", 4, 4_000, Some(last_week)).await;

        let inventory = fx.db.inventory();
        let first = inventory.write_off_expired(today(), &fx.system.id).await.unwrap();
        assert_eq!(first.products_written_off, 1);

        let second = inventory.write_off_expired(today(), &fx.system.id).await.unwrap();
        assert_eq!(second.products_written_off, 0);
        assert!(second.total_loss().is_zero());
        assert_eq!(inventory.logs_for_product(&bread.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_off_requires_known_staff() {
        let fx = fixture().await;
        let last_week = today() - Days::new(7);
        let bread = fx.product("Festive White Bread 400g", 4, 4_000, Some(last_week)).await;

        let err = fx
            .db
            .inventory()
            .write_off_expired(today(), "missing-staff")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnknownReference { .. })));

        let after = fx.db.products().get_by_id(&bread.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 4);
    }

    #[tokio::test]
    async fn test_manual_movements() {
        let fx = fixture().await;
        let rice = fx.product("Pishori Rice 2kg", 5, 30_000, None).await;
        let inventory = fx.db.inventory();

        inventory
            .record_movement(MovementRequest {
                staff_id: fx.cashier.id.clone(),
                product_id: rice.id.clone(),
                log_type: LogType::Purchase,
                quantity: 20,
                remarks: Some("Walk-in delivery".to_string()),
            })
            .await
            .unwrap();

        let adjustment = inventory
            .record_movement(MovementRequest {
                staff_id: fx.cashier.id.clone(),
                product_id: rice.id.clone(),
                log_type: LogType::Adjustment,
                quantity: -2,
                remarks: Some("Torn bags".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(adjustment.adjustment_reason, Some(AdjustmentReason::Manual));

        let err = inventory
            .record_movement(MovementRequest {
                staff_id: fx.cashier.id.clone(),
                product_id: rice.id.clone(),
                log_type: LogType::Sale,
                quantity: 24,
                remarks: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 23, requested: 24, .. })
        ));

        let after = fx.db.products().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 23);

        let logs = inventory.logs_for_product(&rice.id).await.unwrap();
        assert_eq!(logs.iter().map(|l| l.quantity).sum::<i64>(), 18);

        let purchases = inventory
            .list_logs(today(), today(), Some(LogType::Purchase))
            .await
            .unwrap();
        assert_eq!(purchases.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_adjustment_rejected() {
        let fx = fixture().await;
        let rice = fx.product("Pishori Rice 2kg", 5, 30_000, None).await;

        let err = fx
            .db
            .inventory()
            .record_movement(MovementRequest {
                staff_id: fx.cashier.id.clone(),
                product_id: rice.id.clone(),
                log_type: LogType::Adjustment,
                quantity: 0,
                remarks: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
