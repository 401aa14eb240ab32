//! # Sale Line Math
//!
//! Pure checkout arithmetic used by the sale engine in duka-db.
//!
//! ```text
//! SaleLineInput ──validate()──► sub_total = qty × unit_price − discount_value
//!        │
//!        └── requested_quantities() sums lines per product for the stock check
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_amount_cents, validate_line_count, validate_quantity};

/// One line of a sale as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineInput {
    pub product_id: String,
    pub quantity: i64,
    /// Price per unit at checkout, in cents. Snapshotted onto the line.
    pub unit_price_cents: i64,
    /// Line-level discount in cents, if any.
    pub discount_value_cents: Option<i64>,
}

impl SaleLineInput {
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        SaleLineInput {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
            discount_value_cents: None,
        }
    }

    pub fn with_discount(mut self, discount_value: Money) -> Self {
        self.discount_value_cents = Some(discount_value.cents());
        self
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn discount_value(&self) -> Money {
        Money::from_cents(self.discount_value_cents.unwrap_or(0))
    }

    /// Gross line amount before the line discount.
    pub fn gross(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Gross line amount, rejecting a product that does not fit in `i64` cents.
    pub fn checked_gross(&self) -> Result<Money, ValidationError> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "unit_price".to_string(),
                reason: format!("{} × {} overflows", self.unit_price_cents, self.quantity),
            })
    }

    /// `quantity × unit_price − discount_value`.
    pub fn sub_total(&self) -> Money {
        self.gross() - self.discount_value()
    }

    /// Checks quantity, price and line discount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(self.quantity)?;
        validate_amount_cents("unit_price", self.unit_price_cents)?;
        let gross = self.checked_gross()?.cents();

        if let Some(discount) = self.discount_value_cents {
            validate_amount_cents("discount_value", discount)?;
            if discount > gross {
                return Err(ValidationError::OutOfRange {
                    field: "discount_value".to_string(),
                    min: 0,
                    max: gross,
                });
            }
        }

        Ok(())
    }
}

/// Validates every line of a sale.
pub fn validate_lines(lines: &[SaleLineInput]) -> Result<(), ValidationError> {
    validate_line_count(lines.len())?;
    lines.iter().try_for_each(SaleLineInput::validate)?;
    lines_total(lines).map(|_| ())
}

/// Total quantity requested per product, in first-seen order.
///
/// Two lines for the same product are checked against stock together.
pub fn requested_quantities(lines: &[SaleLineInput]) -> Vec<(String, i64)> {
    let mut requested: Vec<(String, i64)> = Vec::new();
    for line in lines {
        match requested.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => requested.push((line.product_id.clone(), line.quantity)),
        }
    }
    requested
}

/// Σ sub_total over the lines, rejecting a sum that overflows.
pub fn lines_total(lines: &[SaleLineInput]) -> Result<Money, ValidationError> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        let sub_total = line.checked_gross()? - line.discount_value();
        acc.checked_add(sub_total)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "lines".to_string(),
                reason: "sale total overflows".to_string(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_total_with_discount() {
        let line = SaleLineInput::new("p-1", 3, Money::from_major(4200))
            .with_discount(Money::from_major(100));
        assert_eq!(line.gross(), Money::from_major(12_600));
        assert_eq!(line.sub_total(), Money::from_major(12_500));
        assert!(line.validate().is_ok());
    }

    #[test]
    fn test_line_validation() {
        assert!(SaleLineInput::new("p-1", 0, Money::from_major(10)).validate().is_err());
        assert!(SaleLineInput::new("p-1", 1, Money::from_cents(-1)).validate().is_err());
        assert!(SaleLineInput::new("", 1, Money::from_major(10)).validate().is_err());

        let too_much_off = SaleLineInput::new("p-1", 1, Money::from_major(10))
            .with_discount(Money::from_major(11));
        assert!(too_much_off.validate().is_err());

        let free = SaleLineInput::new("p-1", 2, Money::zero());
        assert!(free.validate().is_ok());
    }

    #[test]
    fn test_oversized_price_rejected_without_overflow() {
        let huge = SaleLineInput::new("p-1", 2, Money::from_cents(i64::MAX / 2 + 1));
        assert!(matches!(huge.validate(), Err(ValidationError::OutOfRange { .. })));
        assert!(huge.checked_gross().is_err());
        assert!(lines_total(&[huge]).is_err());

        let largest = SaleLineInput::new("p-1", crate::MAX_LINE_QUANTITY, Money::from_cents(crate::MAX_AMOUNT_CENTS));
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_empty_sale_rejected() {
        assert!(validate_lines(&[]).is_err());
    }

    #[test]
    fn test_requested_quantities_are_summed() {
        let lines = vec![
            SaleLineInput::new("milk", 2, Money::from_major(60)),
            SaleLineInput::new("bread", 1, Money::from_major(55)),
            SaleLineInput::new("milk", 3, Money::from_major(60)),
        ];
        assert_eq!(
            requested_quantities(&lines),
            vec![("milk".to_string(), 5), ("bread".to_string(), 1)]
        );
        assert_eq!(lines_total(&lines).unwrap(), Money::from_major(355));
    }
}
