//! # Validation Module
//!
//! Input validation for Duka POS ledger writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (web form / backoffice CLI)                           │
//! │  ├── Type validation (deserialization, argument parsing)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, ranges                                  │
//! │  └── Discount value per type, date windows                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_quantity >= 0)                                       │
//! │  ├── UNIQUE (receipt_no, username, supplier email)                     │
//! │  └── Foreign keys (RESTRICT on sales / logs / orders)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::validation::{validate_receipt_no, validate_quantity};
//!
//! validate_receipt_no("R10001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::DiscountType;
use crate::{MAX_AMOUNT_CENTS, MAX_LINES_PER_SALE, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, length-bounded text field and returns it trimmed.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a receipt number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, slashes only
///
/// ## Example
/// ```rust
/// use duka_core::validation::validate_receipt_no;
///
/// assert!(validate_receipt_no("R-2026/0001").is_ok());
/// assert!(validate_receipt_no("").is_err());
/// assert!(validate_receipt_no("R 1").is_err());
/// ```
pub fn validate_receipt_no(receipt_no: &str) -> ValidationResult<()> {
    let receipt_no = validate_required("receipt_no", receipt_no, 50)?;

    if !receipt_no
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "receipt_no".to_string(),
            reason: "must contain only letters, numbers, hyphens, and slashes".to_string(),
        });
    }

    Ok(())
}

/// Validates a staff login name: 3 to 50 characters, no whitespace.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = validate_required("username", username, 50)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must be at least 3 characters".to_string(),
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Loose e-mail check: one '@' with text on both sides and a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = validate_required("email", email, 254)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in cents (prices, costs, salaries):
/// `0 ≤ cents ≤ MAX_AMOUNT_CENTS`.
///
/// ## Example
/// ```rust
/// use duka_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("retail_price", 1099).is_ok());
/// assert!(validate_amount_cents("retail_price", 0).is_ok());
/// assert!(validate_amount_cents("retail_price", -100).is_err());
/// assert!(validate_amount_cents("retail_price", 10_000_000_000).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock or threshold count (≥ 0).
pub fn validate_stock_count(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount value (in hundredths) against its type.
///
/// ## Rules
/// ```text
/// Percentage  0 < value ≤ 100.00   (1 ..= 10_000 hundredths)
/// Fixed       value > 0
/// Bogo        value ≥ 1.00         (≥ 100 hundredths)
/// ```
pub fn validate_discount_value(
    discount_type: DiscountType,
    value_hundredths: i64,
) -> ValidationResult<()> {
    match discount_type {
        DiscountType::Percentage => {
            if !(1..=10_000).contains(&value_hundredths) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: 10_000,
                });
            }
        }
        DiscountType::Fixed => {
            if value_hundredths <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
            validate_amount_cents("value", value_hundredths)?;
        }
        DiscountType::Bogo => {
            if !(100..=MAX_AMOUNT_CENTS).contains(&value_hundredths) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 100,
                    max: MAX_AMOUNT_CENTS,
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that `start ≤ end`.
pub fn validate_date_range(
    start_field: &str,
    start: NaiveDate,
    end_field: &str,
    end: NaiveDate,
) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::InvalidDateRange {
            start_field: start_field.to_string(),
            end_field: end_field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount validity window: `end_date` strictly after `start_date`.
pub fn validate_discount_window(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::InvalidDateRange {
            start_field: "start_date".to_string(),
            end_field: "end_date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale (at least one, at most MAX_LINES_PER_SALE).
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines > MAX_LINES_PER_SALE {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_LINES_PER_SALE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use duka_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_receipt_no() {
        assert!(validate_receipt_no("R10001").is_ok());
        assert!(validate_receipt_no("2026/10/0001").is_ok());

        assert!(validate_receipt_no("").is_err());
        assert!(validate_receipt_no("   ").is_err());
        assert!(validate_receipt_no("R 1").is_err());
        assert!(validate_receipt_no(&"R".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("amina").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("amina w").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("orders@brookside.co.ke").is_ok());
        assert!(validate_email("orders.brookside.co.ke").is_err());
        assert!(validate_email("orders@localhost").is_err());
        assert!(validate_email("@brookside.co.ke").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents("unit_price", 0).is_ok());
        assert!(validate_amount_cents("unit_price", MAX_AMOUNT_CENTS).is_ok());

        assert!(matches!(
            validate_amount_cents("unit_price", -1),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(matches!(
            validate_amount_cents("unit_price", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));
    }

    #[test]
    fn test_validate_discount_value() {
        assert!(validate_discount_value(DiscountType::Percentage, 1000).is_ok());
        assert!(validate_discount_value(DiscountType::Percentage, 10_000).is_ok());
        assert!(validate_discount_value(DiscountType::Percentage, 0).is_err());
        assert!(validate_discount_value(DiscountType::Percentage, 10_001).is_err());

        assert!(validate_discount_value(DiscountType::Fixed, 500_000).is_ok());
        assert!(validate_discount_value(DiscountType::Fixed, 0).is_err());
        assert!(validate_discount_value(DiscountType::Fixed, MAX_AMOUNT_CENTS + 1).is_err());

        assert!(validate_discount_value(DiscountType::Bogo, 100).is_ok());
        assert!(validate_discount_value(DiscountType::Bogo, 50).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        assert!(validate_date_range("start_date", start, "end_date", end).is_ok());
        assert!(validate_date_range("start_date", start, "end_date", start).is_ok());
        assert!(validate_date_range("start_date", end, "end_date", start).is_err());

        assert!(validate_discount_window(start, end).is_ok());
        assert!(validate_discount_window(start, start).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_LINES_PER_SALE + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
