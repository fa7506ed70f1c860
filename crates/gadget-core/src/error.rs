//! # Error Types
//!
//! Domain-specific error types for gadget-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gadget-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations (cart, checkout)        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gadget-client errors (separate crate)                                 │
//! │  └── ClientError      - Network, storage, config, normalization        │
//! │                                                                         │
//! │  Notice (in gadget-client)                                             │
//! │  └── What the cashier sees as a transient notification                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notice              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule errors.
///
/// These represent rule violations detected before anything is sent to the
/// backend. They are translated to user-facing notices by the client layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the current snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough stock to put the requested quantity in the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "IPH-15", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 IPH-15 in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Item is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A transaction total does not match the sum of its line subtotals.
    #[error("Transaction total {total} does not match item subtotals {expected}")]
    TotalMismatch { total: i64, expected: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when form input doesn't meet requirements.
/// Used for early validation before a mutation reaches the backend.
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
    Negative { field: String },

    /// Invalid format (e.g., malformed email, bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
            sku: "IPH-15".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for IPH-15: available 3, requested 5"
        );

        let err = CoreError::TotalMismatch {
            total: 100,
            expected: 90,
        };
        assert_eq!(
            err.to_string(),
            "Transaction total 100 does not match item subtotals 90"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::Duplicate {
            field: "sku".to_string(),
            value: "IPH-15".to_string(),
        };
        assert_eq!(err.to_string(), "sku 'IPH-15' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "stock".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
