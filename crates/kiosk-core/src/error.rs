//! # Error Types
//!
//! Domain-specific error types for kiosk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kiosk-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kiosk-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  kiosk-server errors                                                   │
//! │  └── ApiError         - What the kiosk / dashboard sees (JSON)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart, pricing and workflow rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id doesn't resolve to a product.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but staff switched it off.
    ///
    /// ## User Workflow
    /// ```text
    /// Staff toggles "Mrs Peanut" unavailable
    ///      │
    ///      ▼
    /// Kiosk still had it on screen, customer taps it
    ///      │
    ///      ▼
    /// ProductUnavailable("mrsPeanut") → "sold out" toast
    /// ```
    #[error("Product is not available: {0}")]
    ProductUnavailable(String),

    /// Drink requires a milk choice and none was given.
    #[error("{product} requires a milk selection")]
    MilkRequired { product: String },

    /// Milk was chosen for a product that isn't made with milk.
    #[error("{product} does not take milk")]
    MilkNotAllowed { product: String },

    /// No cart line matches the given variant key.
    #[error("Item not in cart: {0}")]
    LineNotInCart(String),

    /// Checkout or order submission with nothing in it.
    #[error("Order has no items")]
    EmptyOrder,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Status change that the workflow forbids (backwards, skipping, or out of a terminal state).
    #[error("Order {order_number} cannot move from {from} to {to}")]
    InvalidTransition {
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business rule runs.
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

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

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
        let err = CoreError::InvalidTransition {
            order_number: "M007".to_string(),
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.to_string(), "Order M007 cannot move from completed to pending");

        let err = CoreError::MilkRequired {
            product: "matchaLatte".to_string(),
        };
        assert_eq!(err.to_string(), "matchaLatte requires a milk selection");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
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
