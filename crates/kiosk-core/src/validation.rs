//! # Validation Module
//!
//! Input validation utilities for the kiosk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Kiosk / dashboard frontend                                   │
//! │  └── Immediate feedback (disabled buttons, empty fields)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock >= 0, quantity > 0)                      │
//! │  ├── UNIQUE constraints (order_number, admin email)                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock and price inputs are not rejected when negative: the inventory
//! rules clamp them at zero instead (see [`crate::inventory`]).

use crate::error::ValidationError;
use crate::types::AppSettings;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product id.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only (covers "12" and UUIDs)
///
/// ```rust
/// use kiosk_core::validation::validate_product_id;
///
/// assert!(validate_product_id("12").is_ok());
/// assert!(validate_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_product_id("").is_err());
/// assert!(validate_product_id("drop table").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 64,
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name key ("matchaLatte").
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
/// - ASCII letters and digits only (it indexes translation tables)
pub fn validate_name_key(name_key: &str) -> ValidationResult<()> {
    if name_key.is_empty() {
        return Err(ValidationError::Required {
            field: "name_key".to_string(),
        });
    }

    if name_key.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name_key".to_string(),
            max: 100,
        });
    }

    if !name_key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "name_key".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an admin email address.
///
/// Only a shape check: one '@' with text on both sides and a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

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

/// Validates a new admin password.
///
/// ## Rules
/// - At least 8 characters
/// - At most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len < 8 {
        return Err(ValidationError::OutOfRange {
            field: "password length".to_string(),
            min: 8,
            max: 128,
        });
    }

    if len > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Order submission                                                       │
/// │                                                                         │
/// │  { product_id: "1", quantity: 2, milk: "oat" }                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(2) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → price the line                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents for a new product.
///
/// Zero is allowed (staff sometimes list a free sample).
///
/// ```rust
/// use kiosk_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(550).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_cents_field("price", cents)
}

fn validate_cents_field(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates the surcharge and add-on prices of a settings value.
pub fn validate_settings(settings: &AppSettings) -> ValidationResult<()> {
    validate_cents_field("large_size_extra_cents", settings.large_size_extra_cents)?;
    validate_cents_field("extra_collagen_price_cents", settings.extra_collagen_price_cents)?;
    validate_cents_field("extra_ashwagandha_price_cents", settings.extra_ashwagandha_price_cents)?;
    validate_cents_field("extra_honey_price_cents", settings.extra_honey_price_cents)
}

/// Validates a stock input before clamping.
///
/// Negative values are accepted (they clamp to zero); absurdly large ones
/// are typos.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a stock adjustment. Either direction is bounded by [`MAX_STOCK`].
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta.unsigned_abs() > MAX_STOCK as u64 {
        return Err(ValidationError::OutOfRange {
            field: "stock delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a low-stock threshold.
pub fn validate_low_stock_threshold(threshold: i64) -> ValidationResult<()> {
    if !(0..=100_000).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "low_stock_threshold".to_string(),
            min: 0,
            max: 100_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of distinct lines in a cart or order.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("1").is_ok());
        assert!(validate_product_id("house_blend-2").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id("a b").is_err());
        assert!(validate_product_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_name_key() {
        assert!(validate_name_key("matchaLatte").is_ok());
        assert!(validate_name_key("").is_err());
        assert!(validate_name_key("matcha latte").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  M00 ").unwrap(), "M00");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("staff@matcha.cafe").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("staff").is_err());
        assert!(validate_email("@matcha.cafe").is_err());
        assert!(validate_email("staff@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
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
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_CART_ITEMS).is_ok());
        assert!(validate_line_count(MAX_CART_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_low_stock_threshold(0).is_ok());
        assert!(validate_low_stock_threshold(10).is_ok());
        assert!(validate_low_stock_threshold(-1).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(-3).is_ok());
        assert!(validate_stock(250).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());
    }

    #[test]
    fn test_validate_stock_delta() {
        assert!(validate_stock_delta(-40).is_ok());
        assert!(validate_stock_delta(MAX_STOCK).is_ok());
        assert!(validate_stock_delta(i64::MAX).is_err());
        assert!(validate_stock_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_prices_and_settings() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());

        let mut settings = AppSettings::default();
        assert!(validate_settings(&settings).is_ok());
        settings.extra_honey_price_cents = i64::MAX;
        assert!(validate_settings(&settings).is_err());
    }
}
