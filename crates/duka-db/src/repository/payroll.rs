//! # Payroll Repository
//!
//! Records salary payments. The net amount is computed here from the
//! components and stored; callers never supply it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use duka_core::payroll::net_salary;
use duka_core::{Money, Payroll, PayrollMethod};

const SELECT_PAYROLL: &str = r#"
    SELECT
        id, staff_id, payment_date, basic_salary_cents,
        allowances_cents, deductions_cents, net_salary_cents, payment_method
    FROM payroll
"#;

/// A salary payment to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEntry {
    pub staff_id: String,
    pub payment_date: NaiveDate,
    pub basic_salary: Money,
    pub allowances: Option<Money>,
    pub deductions: Option<Money>,
    pub payment_method: PayrollMethod,
}

#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: SqlitePool,
}

impl PayrollRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PayrollRepository { pool }
    }

    /// Records a payment with `net = max(0, basic + allowances − deductions)`.
    pub async fn record(&self, entry: PayrollEntry) -> DbResult<Payroll> {
        let net = net_salary(entry.basic_salary, entry.allowances, entry.deductions)?;

        let payroll = Payroll {
            id: new_id(),
            staff_id: entry.staff_id,
            payment_date: entry.payment_date,
            basic_salary_cents: entry.basic_salary.cents(),
            allowances_cents: entry.allowances.map(|m| m.cents()),
            deductions_cents: entry.deductions.map(|m| m.cents()),
            net_salary_cents: net.cents(),
            payment_method: entry.payment_method,
        };

        sqlx::query(
            r#"
            INSERT INTO payroll (
                id, staff_id, payment_date, basic_salary_cents,
                allowances_cents, deductions_cents, net_salary_cents, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payroll.id)
        .bind(&payroll.staff_id)
        .bind(payroll.payment_date)
        .bind(payroll.basic_salary_cents)
        .bind(payroll.allowances_cents)
        .bind(payroll.deductions_cents)
        .bind(payroll.net_salary_cents)
        .bind(payroll.payment_method)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_foreign_key_violation() => DbError::unknown("Staff", &payroll.staff_id),
            err => err,
        })?;

        info!(
            staff_id = %payroll.staff_id,
            payment_date = %payroll.payment_date,
            net = %net,
            "Payroll recorded"
        );

        Ok(payroll)
    }

    /// Payments for one staff member, newest first.
    pub async fn list_for_staff(&self, staff_id: &str) -> DbResult<Vec<Payroll>> {
        let payments = sqlx::query_as::<_, Payroll>(&format!(
            "{SELECT_PAYROLL} WHERE staff_id = ?1 ORDER BY payment_date DESC, id"
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Payments made between `from` and `to` (inclusive).
    pub async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Payroll>> {
        let payments = sqlx::query_as::<_, Payroll>(&format!(
            "{SELECT_PAYROLL} WHERE payment_date >= ?1 AND payment_date <= ?2 ORDER BY payment_date, id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, today};
    use duka_core::CoreError;

    fn entry(staff_id: &str, deductions: i64) -> PayrollEntry {
        PayrollEntry {
            staff_id: staff_id.to_string(),
            payment_date: today(),
            basic_salary: Money::from_major(30_000),
            allowances: Some(Money::from_major(5_000)),
            deductions: Some(Money::from_major(deductions)),
            payment_method: PayrollMethod::BankTransfer,
        }
    }

    #[tokio::test]
    async fn test_record_computes_net() {
        let fx = fixture().await;
        let repo = fx.db.payroll();

        let paid = repo.record(entry(&fx.cashier.id, 2_500)).await.unwrap();
        assert_eq!(paid.net_salary(), Money::from_major(32_500));

        let floored = repo.record(entry(&fx.cashier.id, 50_000)).await.unwrap();
        assert_eq!(floored.net_salary_cents, 0);

        let history = repo.list_for_staff(&fx.cashier.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(repo.list_between(today(), today()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_rejects_bad_input() {
        let fx = fixture().await;
        let repo = fx.db.payroll();

        let err = repo.record(entry(&fx.cashier.id, -1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = repo.record(entry("ghost", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnknownReference { .. })));
    }
}
