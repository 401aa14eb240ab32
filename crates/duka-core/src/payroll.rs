//! # Payroll Math
//!
//! `net = max(0, basic + allowances − deductions)`

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::validate_amount_cents;

/// Computes a net salary, rejecting negative inputs.
///
/// ## Example
/// ```rust
/// use duka_core::money::Money;
/// use duka_core::payroll::net_salary;
///
/// let net = net_salary(
///     Money::from_major(30_000),
///     Some(Money::from_major(5_000)),
///     Some(Money::from_major(2_500)),
/// )
/// .unwrap();
/// assert_eq!(net, Money::from_major(32_500));
/// ```
pub fn net_salary(
    basic: Money,
    allowances: Option<Money>,
    deductions: Option<Money>,
) -> Result<Money, ValidationError> {
    let allowances = allowances.unwrap_or_default();
    let deductions = deductions.unwrap_or_default();

    validate_amount_cents("basic_salary", basic.cents())?;
    validate_amount_cents("allowances", allowances.cents())?;
    validate_amount_cents("deductions", deductions.cents())?;

    Ok((basic + allowances - deductions).floor_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_salary_without_extras() {
        let net = net_salary(Money::from_major(20_000), None, None).unwrap();
        assert_eq!(net, Money::from_major(20_000));
    }

    #[test]
    fn test_net_salary_floors_at_zero() {
        let net = net_salary(
            Money::from_major(1_000),
            None,
            Some(Money::from_major(1_500)),
        )
        .unwrap();
        assert_eq!(net, Money::zero());
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(net_salary(Money::from_major(-1), None, None).is_err());
        assert!(net_salary(Money::from_major(10), Some(Money::from_cents(-5)), None).is_err());
    }
}
