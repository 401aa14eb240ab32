//! # Domain Types
//!
//! Ledger entities used throughout Duka POS.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ledger Entities                                 │
//! │                                                                         │
//! │  Category ─┐                      ┌──────────── Staff ───────────┐      │
//! │            ├──► Product ◄─┐       │                              │      │
//! │  Supplier ─┘       ▲      │       ▼                              ▼      │
//! │      │             │      └── SaleLine ◄── Sale ──► SaleDiscount        │
//! │      │             │                        │            │              │
//! │      ▼             │                    Customer      Discount          │
//! │  PurchaseOrder ──► PurchaseOrderLine                                    │
//! │                                                                         │
//! │  InventoryLog (append-only) ──► Product, Staff                          │
//! │  Payroll ──► Staff                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `id`: UUID v4 string, assigned by the store
//! - Currency columns end in `_cents` and have a `Money` accessor
//! - Snapshot fields (`SaleLine.unit_price_cents`) never follow live prices

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Reference Entities
// =============================================================================

/// A product category ("Dairy", "Bakery", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub description: Option<String>,
}

/// A supplier of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_number: Option<String>,
    /// Unique when present.
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A customer. All fields optional; walk-in sales carry no customer at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    /// "First Last", trimmed; empty for anonymous customers.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

// =============================================================================
// Staff
// =============================================================================

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Cashier,
    Manager,
    Admin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Cashier => "cashier",
            StaffRole::Manager => "manager",
            StaffRole::Admin => "admin",
        }
    }
}

/// A staff member (cashier, manager, admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: StaffRole,
    pub phone: Option<String>,
    /// Unique login name.
    pub username: String,
    /// Opaque hash produced by the authentication layer.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    /// Unit label: "btl", "kg", "pack", ...
    pub unit: String,
    /// Purchase cost per unit, in cents. Drives write-off losses.
    pub unit_cost_cents: i64,
    /// Shelf price per unit, in cents.
    pub retail_price_cents: i64,
    /// Units on hand. Never negative after a committed operation.
    pub stock_quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    /// Restock threshold (informational).
    pub reorder_level: i64,
    pub batch_number: Option<String>,
    pub category_id: String,
    pub supplier_id: String,
}

impl Product {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    #[inline]
    pub fn retail_price(&self) -> Money {
        Money::from_cents(self.retail_price_cents)
    }

    /// True when the product expired strictly before `as_of`.
    ///
    /// A product expiring today is still sellable today.
    pub fn is_expired_on(&self, as_of: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < as_of)
    }

    /// True when stock has dropped to or below the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }

    /// Checks if `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the sale total (0 < value ≤ 100).
    Percentage,
    /// `value` is a currency amount taken off the remaining total.
    Fixed,
    /// "Buy one get one": approximated on the aggregate total as
    /// `total × value / (value + 1)`. Line items are not paired.
    Bogo,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
            DiscountType::Bogo => "bogo",
        }
    }
}

/// A store-wide discount scheme with a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: String,
    pub name: String,
    pub discount_type: DiscountType,
    /// Numeric value with two decimal places, stored in hundredths:
    /// Percentage 10% → 1000, Fixed 5,000.00 → 500000, BOGO 1 → 100.
    pub value_hundredths: i64,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub is_active: bool,
}

impl Discount {
    /// Active and `start_date ≤ date ≤ end_date`.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.start_date <= date && date <= self.end_date
    }
}

/// Association of a discount with a specific product (catalog tagging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductDiscount {
    pub product_id: String,
    pub discount_id: String,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mobile_money" | "mobilemoney" | "momo" => Ok(PaymentMethod::MobileMoney),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "mobile_money".into()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed checkout.
///
/// Created once; `total_cents` is written a second time only inside the
/// same transaction, after discount resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub staff_id: String,
    /// First applied discount (single-discount field kept for reporting).
    pub discount_id: Option<String>,
    #[ts(as = "String")]
    pub sale_datetime: DateTime<Utc>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Store-wide discount taken off the sum of line sub_totals.
    pub discount_applied_cents: Option<i64>,
    /// Unique receipt number.
    pub receipt_no: String,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn discount_applied(&self) -> Money {
        Money::from_cents(self.discount_applied_cents.unwrap_or(0))
    }
}

/// A line item in a sale.
/// Uses the snapshot pattern: `unit_price_cents` is frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// Position within the sale (0-based), keeps receipt order stable.
    pub line_no: i64,
    pub product_id: String,
    pub quantity_sold: i64,
    pub unit_price_cents: i64,
    pub discount_value_cents: Option<i64>,
    /// quantity_sold × unit_price − discount_value.
    pub sub_total_cents: i64,
    pub batch_number: Option<String>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn sub_total(&self) -> Money {
        Money::from_cents(self.sub_total_cents)
    }

    /// Checks `sub_total == quantity × unit_price − discount_value`.
    pub fn reconciles(&self) -> bool {
        let expected = self.unit_price().multiply_quantity(self.quantity_sold)
            - Money::from_cents(self.discount_value_cents.unwrap_or(0));
        expected == self.sub_total()
    }
}

/// One discount's contribution to a sale's `discount_applied`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleDiscount {
    pub sale_id: String,
    pub discount_id: String,
    pub amount_cents: i64,
}

// =============================================================================
// Inventory Log
// =============================================================================

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    /// Stock in from a supplier.
    Purchase,
    /// Stock out at checkout. Logged with a negative quantity
    /// (`-quantity_sold`), like every other stock-out movement.
    Sale,
    /// Any other correction; always carries an `AdjustmentReason`.
    Adjustment,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Purchase => "purchase",
            LogType::Sale => "sale",
            LogType::Adjustment => "adjustment",
        }
    }
}

impl FromStr for LogType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Ok(LogType::Purchase),
            "sale" => Ok(LogType::Sale),
            "adjustment" => Ok(LogType::Adjustment),
            _ => Err(ValidationError::NotAllowed {
                field: "log_type".to_string(),
                allowed: vec!["purchase".into(), "sale".into(), "adjustment".into()],
            }),
        }
    }
}

/// Why an adjustment happened. Reports filter on this, never on remarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Stock zeroed by the expiry write-off batch.
    ExpiryWriteOff,
    /// Manual correction (stock count, damage, ...).
    Manual,
}

/// Append-only audit record of a stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryLog {
    pub id: String,
    pub staff_id: String,
    pub product_id: String,
    pub log_type: LogType,
    /// Signed: positive = stock in, negative = stock out.
    pub quantity: i64,
    #[ts(as = "String")]
    pub logged_at: DateTime<Utc>,
    pub remarks: Option<String>,
    /// Present iff `log_type` is `Adjustment`.
    pub adjustment_reason: Option<AdjustmentReason>,
    /// Unit cost snapshotted by the expiry write-off, `None` on other rows.
    pub unit_cost_cents: Option<i64>,
}

// =============================================================================
// Purchase Orders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for PurchaseOrderStatus {
    fn default() -> Self {
        PurchaseOrderStatus::Pending
    }
}

/// An order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub supplier_id: String,
    pub staff_id: String,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    /// Σ line sub_totals.
    pub total_cost_cents: i64,
    pub invoice_no: Option<String>,
}

/// A product line of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub unit_cost_cents: i64,
    pub sub_total_cents: i64,
}

// =============================================================================
// Payroll
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PayrollMethod {
    Cash,
    BankTransfer,
    Check,
    MobileMoney,
}

/// A salary payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payroll {
    pub id: String,
    pub staff_id: String,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub basic_salary_cents: i64,
    pub allowances_cents: Option<i64>,
    pub deductions_cents: Option<i64>,
    /// max(0, basic + allowances − deductions).
    pub net_salary_cents: i64,
    pub payment_method: PayrollMethod,
}

impl Payroll {
    #[inline]
    pub fn net_salary(&self) -> Money {
        Money::from_cents(self.net_salary_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
