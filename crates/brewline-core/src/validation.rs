//! # Validation Module
//!
//! Input validation for values typed at the counter or on the admin screen.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI argument parsing (clap)                                   │
//! │  ├── Types and required flags                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: business rule validation                         │
//! │  ├── Customer number / name, quantities, ingredient edits               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database                                                      │
//! │  ├── NOT NULL, UNIQUE, CHECK and foreign key constraints                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use brewline_core::validation::{validate_customer_number, validate_quantity};
//!
//! validate_customer_number("0412 555 010").unwrap();
//! validate_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer number and returns it trimmed.
///
/// ## Rules
/// - Required
/// - At most 32 characters
/// - Digits, spaces, `+` and `-` only (phone-number style)
pub fn validate_customer_number(number: &str) -> ValidationResult<String> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::required("customer number"));
    }

    if number.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "customer number".to_string(),
            max: 32,
        });
    }

    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '+' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer number".to_string(),
            reason: "must contain only letters, digits, spaces, '+' and '-'".to_string(),
        });
    }

    Ok(number.to_string())
}

/// Validates a new customer's name and returns it trimmed.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("customer name"));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 100,
        });
    }

    Ok(name.to_string())
}

/// Validates an ingredient name on an admin edit.
pub fn validate_ingredient_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("ingredient"));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "ingredient".to_string(),
            max: 100,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
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

/// Validates a stock quantity typed by an admin.
///
/// Negative on-hand stock is legal (oversold ingredients), so only NaN and
/// infinities are rejected.
pub fn validate_stock_quantity(field: &str, qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a safety-stock threshold: finite and not negative.
pub fn validate_safety_stock(qty: f64) -> ValidationResult<()> {
    validate_stock_quantity("safety stock", qty)?;
    if qty < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "safety stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a cart line count for a saved order.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates an order or invoice id.
///
/// ## Example
/// ```rust
/// use brewline_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
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
    fn test_validate_customer_number() {
        assert_eq!(validate_customer_number("  0412 555 010 ").unwrap(), "0412 555 010");
        assert_eq!(validate_customer_number("+61-400").unwrap(), "+61-400");

        assert_eq!(
            validate_customer_number("   "),
            Err(ValidationError::required("customer number"))
        );
        assert!(validate_customer_number("call me; maybe").is_err());
        assert!(validate_customer_number(&"1".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name(" Ana ").unwrap(), "Ana");
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_stock_quantities() {
        assert!(validate_stock_quantity("quantity", -400.0).is_ok());
        assert!(validate_stock_quantity("quantity", f64::NAN).is_err());
        assert!(validate_stock_quantity("quantity", f64::INFINITY).is_err());

        assert!(validate_safety_stock(0.0).is_ok());
        assert!(validate_safety_stock(-1.0).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
