//! # duka-core: Pure Business Logic for Duka POS
//!
//! This crate holds the ledger rules of Duka POS as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Callers: web layer (external), duka-backoffice CLI       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   duka-db (Ledger Store)                        │   │
//! │  │     SaleRepository::record_sale, InventoryRepository::          │   │
//! │  │     write_off_expired, reports, reference CRUD                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ discount │ │  sale  │ │ expiry  │  │   │
//! │  │   │ Product │ │  Money  │ │ resolve_ │ │  line  │ │ loss    │  │   │
//! │  │   │  Sale   │ │ ratio % │ │ discount │ │  math  │ │ entries │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Ledger entities (Product, Sale, InventoryLog, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`discount`] - Store-wide discount resolution
//! - [`sale`] - Sale line arithmetic and validation
//! - [`expiry`] - Expiry write-off selection and loss
//! - [`payroll`] - Net salary
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::money::Money;
//! use duka_core::sale::SaleLineInput;
//!
//! let line = SaleLineInput::new("p-milk", 3, Money::from_major(60));
//! assert_eq!(line.sub_total().to_string(), "180.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod expiry;
pub mod money;
pub mod payroll;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{resolve_discount, AppliedDiscount, DiscountResolution, StackingOrder};
pub use error::{CoreError, CoreResult, ValidationError};
pub use expiry::{WriteOffEntry, WriteOffSummary};
pub use money::Money;
pub use sale::SaleLineInput;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single sale.
pub const MAX_LINES_PER_SALE: usize = 200;

/// Maximum quantity on a single sale line.
///
/// Catches typing 1000 instead of 10 at the till.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Largest price, cost, discount or salary amount: 99,999,999.99.
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_LINES_PER_SALE`] this keeps every
/// sale total well inside `i64` cents.
pub const MAX_AMOUNT_CENTS: i64 = 9_999_999_999;

/// Reorder level given to products created without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Username of the staff row the scheduled write-off acts as.
pub const DEFAULT_SYSTEM_STAFF: &str = "system";
