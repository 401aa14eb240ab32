//! # Repository Module
//!
//! Ledger store repositories for Duka POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.sales().record_sale(request)                               │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────┐   ┌───────────────────────────┐         │
//! │  │ Engines (transactional)   │   │ Reference CRUD            │         │
//! │  │ SaleRepository            │   │ Category, Supplier,       │         │
//! │  │ InventoryRepository       │   │ Customer, Staff,          │         │
//! │  │ PurchaseOrderRepository   │   │ Product, Discount         │         │
//! │  │ PayrollRepository         │   └───────────────────────────┘         │
//! │  └───────────────────────────┘   ┌───────────────────────────┐         │
//! │                                  │ ReportRepository (reads)  │         │
//! │                                  └───────────────────────────┘         │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `insert` assigns a fresh UUID when the given `id` is empty and returns
//!   the stored row
//! - `update` / `delete` on a missing row return `DbError::NotFound`
//! - `delete` of a row still referenced elsewhere returns
//!   `CoreError::ReferenceInUse`

pub mod category;
pub mod customer;
pub mod discount;
pub mod inventory;
pub mod payroll;
pub mod product;
pub mod purchase_order;
pub mod report;
pub mod sale;
pub mod staff;
pub mod supplier;

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbError;

/// Generates a new entity ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Keeps `id` if set, otherwise generates one.
pub(crate) fn id_or_new(id: &str) -> String {
    if id.trim().is_empty() {
        new_id()
    } else {
        id.to_string()
    }
}

/// Maps a failed DELETE: FK violations mean the row is still referenced.
pub(crate) fn delete_error(err: sqlx::Error, entity: &str, id: &str) -> DbError {
    match DbError::from(err) {
        e if e.is_foreign_key_violation() => DbError::in_use(entity, id),
        e => e,
    }
}

/// Half-open UTC range `[from 00:00, to + 1 day 00:00)` covering both dates.
pub(crate) fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end_day = to.checked_add_days(Days::new(1)).unwrap_or(to);
    let end = end_day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_or_new() {
        assert_eq!(id_or_new("p-1"), "p-1");
        assert_eq!(id_or_new("").len(), 36);
    }

    #[test]
    fn test_day_bounds_cover_whole_days() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let (start, end) = day_bounds(day, day);
        assert_eq!(start.to_rfc3339(), "2026-10-18T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-10-19T00:00:00+00:00");
    }
}
