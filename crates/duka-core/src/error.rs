//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  duka-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (web / CLI)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, receipt, ID)
//! 3. Errors are enum variants, never String
//! 4. Only `InsufficientStock` is expected to be recovered by the caller

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. None of them is retried
/// inside the core; a sale resubmission is not idempotent.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to complete a sale or stock-out movement.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: 6 × Brookside Whole Milk 1L
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Brookside Whole Milk 1L", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Nothing written. Cashier reduces the quantity and resubmits.
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product: String,
        requested: i64,
        available: i64,
    },

    /// The receipt number is already used by another sale.
    #[error("Receipt number '{0}' already exists")]
    DuplicateReceipt(String),

    /// A referenced row (product, staff, customer, discount, ...) does not exist.
    #[error("{entity} not found: {id}")]
    UnknownReference { entity: String, id: String },

    /// A row cannot be deleted because sales, logs or orders still point at it.
    #[error("{entity} {id} is still referenced and cannot be deleted")]
    ReferenceInUse { entity: String, id: String },

    /// The entity is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Receiving a purchase order that was already received
    /// - Cancelling a received purchase order
    #[error("{entity} {id} is {status}, cannot perform operation")]
    InvalidStatus {
        entity: String,
        id: String,
        status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an UnknownReference error for a given entity type and ID.
    pub fn unknown(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::UnknownReference {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns true for the one failure the caller is expected to recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::InsufficientStock { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range is empty or reversed.
    #[error("{end_field} must be after {start_field}")]
    InvalidDateRange {
        start_field: String,
        end_field: String,
    },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            product: "Brookside Whole Milk 1L".to_string(),
            requested: 6,
            available: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Brookside Whole Milk 1L: available 5, requested 6"
        );
        assert!(err.is_recoverable());

        let err = CoreError::DuplicateReceipt("R10001".to_string());
        assert_eq!(err.to_string(), "Receipt number 'R10001' already exists");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "receipt_no".to_string(),
        };
        assert_eq!(err.to_string(), "receipt_no is required");

        let err = ValidationError::InvalidDateRange {
            start_field: "start_date".to_string(),
            end_field: "end_date".to_string(),
        };
        assert_eq!(err.to_string(), "end_date must be after start_date");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
