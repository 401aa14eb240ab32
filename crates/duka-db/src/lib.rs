//! # duka-db: Ledger Store for Duka POS
//!
//! SQLite persistence for the supermarket ledger, with sqlx for async
//! access. Every engine operation (sale, expiry write-off, stock movement,
//! order receipt) is one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Data Flow                               │
//! │                                                                         │
//! │  duka-backoffice (writeoff / discounts / reorder)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InventoryRepo │    │ 001_initial_ │  │   │
//! │  │   │ StackingOrder │    │ ReportRepo    │    │   schema.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ discount / payroll math       │   │
//! │  │                                ▼                               │   │
//! │  │                           duka-core                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories, the sale engine and the expiry batch
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{Database, DbConfig, SaleRequest};
//!
//! let db = Database::new(DbConfig::new("duka.db")).await?;
//!
//! let sale = db.sales().record_sale(request).await?;
//! let summary = db.inventory().write_off_expired(today, &system.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::inventory::{InventoryRepository, MovementRequest};
pub use repository::payroll::{PayrollEntry, PayrollRepository};
pub use repository::product::ProductRepository;
pub use repository::purchase_order::{NewPurchaseOrder, OrderLineInput, PurchaseOrderRepository};
pub use repository::report::{CategoryTotal, ExpiryLoss, ReportRepository, SalesKpi, YearTotal};
pub use repository::sale::{SaleRepository, SaleRequest};
pub use repository::staff::StaffRepository;
pub use repository::supplier::SupplierRepository;
