//! # Discount Resolution
//!
//! Decides how much store-wide discount a sale receives.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_discount(sale_total, sale_date, discounts, order)             │
//! │                                                                         │
//! │  discounts ──► eligible on sale_date? ──► sort by StackingOrder        │
//! │                (is_active, window)                  │                   │
//! │                                                     ▼                   │
//! │                          ┌──────── for each discount ────────┐          │
//! │                          │ Percentage: total × value / 100   │          │
//! │                          │ Fixed:      min(value, remaining) │          │
//! │                          │ Bogo:       total × v / (v + 1)   │          │
//! │                          └───────────────┬───────────────────┘          │
//! │                                          ▼                              │
//! │                     running ≥ total? ──► cap at total, stop             │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                     DiscountResolution { amount, applied }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentage and BOGO amounts are taken from the sale total, not from what
//! is left after earlier discounts. Rounding is half-up to the cent.
//!
//! ## Example
//! ```rust
//! use chrono::NaiveDate;
//! use duka_core::discount::{resolve_discount, StackingOrder};
//! use duka_core::money::Money;
//!
//! let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
//! let resolution = resolve_discount(Money::from_major(500), date, &[], StackingOrder::default());
//! assert!(resolution.amount.is_zero());
//! assert!(resolution.applied.is_empty());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Discount, DiscountType};

// =============================================================================
// Stacking Order
// =============================================================================

/// Precedence in which eligible discounts are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StackingOrder {
    /// Fixed first, then Percentage, then BOGO. Within a type by value
    /// descending, ties by name.
    #[default]
    TypeAware,
    /// Raw numeric value descending regardless of type (a Fixed 5,000.00
    /// always outranks a 10% Percentage). Ties by name.
    RawValue,
}

impl StackingOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackingOrder::TypeAware => "type_aware",
            StackingOrder::RawValue => "raw_value",
        }
    }

    fn compare(&self, a: &Discount, b: &Discount) -> Ordering {
        let by_value = b.value_hundredths.cmp(&a.value_hundredths);
        let by_name = a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id));

        match self {
            StackingOrder::TypeAware => type_rank(a.discount_type)
                .cmp(&type_rank(b.discount_type))
                .then(by_value)
                .then(by_name),
            StackingOrder::RawValue => by_value.then(by_name),
        }
    }
}

fn type_rank(discount_type: DiscountType) -> u8 {
    match discount_type {
        DiscountType::Fixed => 0,
        DiscountType::Percentage => 1,
        DiscountType::Bogo => 2,
    }
}

impl fmt::Display for StackingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StackingOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "type_aware" | "type-aware" => Ok(StackingOrder::TypeAware),
            "raw_value" | "raw-value" => Ok(StackingOrder::RawValue),
            _ => Err(ValidationError::NotAllowed {
                field: "stacking_order".to_string(),
                allowed: vec!["type_aware".into(), "raw_value".into()],
            }),
        }
    }
}

// =============================================================================
// Resolution Result
// =============================================================================

/// One discount's share of the resolved amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub discount_id: String,
    pub name: String,
    pub discount_type: DiscountType,
    /// Amount actually taken off (after capping), in cents.
    pub amount_cents: i64,
}

impl AppliedDiscount {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Outcome of discount resolution for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscountResolution {
    /// Total discount, never more than the sale total.
    pub amount: Money,
    /// Discounts that contributed, in application order.
    pub applied: Vec<AppliedDiscount>,
}

impl DiscountResolution {
    pub fn none() -> Self {
        DiscountResolution::default()
    }

    /// Sale total after the discount, floored at zero.
    pub fn apply_to(&self, sale_total: Money) -> Money {
        (sale_total - self.amount).floor_zero()
    }

    /// First applied discount, kept on the sale row for reporting.
    pub fn primary_discount_id(&self) -> Option<&str> {
        self.applied.first().map(|a| a.discount_id.as_str())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Returns the discounts valid on `date`, in stacking order.
pub fn eligible_on<'a>(
    discounts: &'a [Discount],
    date: NaiveDate,
    order: StackingOrder,
) -> Vec<&'a Discount> {
    let mut eligible: Vec<&Discount> = discounts.iter().filter(|d| d.is_valid_on(date)).collect();
    eligible.sort_by(|a, b| order.compare(a, b));
    eligible
}

/// Amount a single discount takes off.
///
/// `remaining` is what is left of the sale total after earlier discounts;
/// only Fixed discounts are bounded by it.
pub fn discount_amount(discount: &Discount, sale_total: Money, remaining: Money) -> Money {
    let value = discount.value_hundredths;
    match discount.discount_type {
        DiscountType::Percentage => sale_total.percentage(value),
        // Fixed values are currency with two decimals, so hundredths == cents.
        DiscountType::Fixed => Money::from_cents(value).min(remaining.floor_zero()),
        DiscountType::Bogo => sale_total.ratio(value, value + 100),
    }
}

/// Resolves the store-wide discount for a sale.
///
/// ## Rules
/// - Only discounts valid on `sale_date` are considered
/// - Discounts are applied in `order`
/// - The running amount is capped at `sale_total`; resolution stops there
/// - No eligible discount ⇒ zero amount, empty list
pub fn resolve_discount(
    sale_total: Money,
    sale_date: NaiveDate,
    discounts: &[Discount],
    order: StackingOrder,
) -> DiscountResolution {
    if !sale_total.is_positive() {
        return DiscountResolution::none();
    }

    let mut running = Money::zero();
    let mut applied = Vec::new();

    for discount in eligible_on(discounts, sale_date, order) {
        let amount = discount_amount(discount, sale_total, sale_total - running);
        if amount.is_zero() {
            continue;
        }

        let capped = running + amount >= sale_total;
        let taken = if capped { sale_total - running } else { amount };

        running += taken;
        applied.push(AppliedDiscount {
            discount_id: discount.id.clone(),
            name: discount.name.clone(),
            discount_type: discount.discount_type,
            amount_cents: taken.cents(),
        });

        if capped {
            break;
        }
    }

    DiscountResolution {
        amount: running,
        applied,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
