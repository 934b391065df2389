//! # Error Types
//!
//! Domain-specific error types for brewline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  brewline-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  brewline-db errors (separate crate)                                   │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - What workflow callers see                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → CLI                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, order id, ...)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::order::{KitchenStatus, OrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id is not on the menu.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Paying an order that is already Paid (double payment)
    /// - Editing or cancelling a Paid or Cancelled order
    #[error("Order {order_id} is {current:?}, cannot {action}")]
    InvalidOrderStatus {
        order_id: String,
        current: OrderStatus,
        action: &'static str,
    },

    /// Invoice is not in a kitchen state that allows the transition.
    #[error("Invoice {invoice_id} is {current:?}, cannot {action}")]
    InvalidKitchenStatus {
        invoice_id: String,
        current: KitchenStatus,
        action: &'static str,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Admin credentials did not match.
    #[error("Invalid admin id or password")]
    Unauthorized,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are recoverable: the caller reports them and nothing is committed.
#[derive(Debug, Error, PartialEq)]
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

    /// Value must be a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection must not be empty.
    #[error("{field} is empty")]
    Empty { field: String },
}

impl ValidationError {
    /// Creates a `Required` error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
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
    fn test_order_status_message() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            current: OrderStatus::Paid,
            action: "finalize payment",
        };
        assert_eq!(err.to_string(), "Order o-1 is Paid, cannot finalize payment");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("customer number");
        assert_eq!(err.to_string(), "customer number is required");

        let err = ValidationError::Empty {
            field: "cart".to_string(),
        };
        assert_eq!(err.to_string(), "cart is empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("sku").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
