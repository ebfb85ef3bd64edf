//! # HTTP Handlers
//!
//! Every route the kiosk and the admin dashboard call.
//!
//! ## Handler Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports, shared query helpers)
//! ├── health.rs     ◄─── Liveness + database check
//! ├── menu.rs       ◄─── Public menu and settings
//! ├── cart.rs       ◄─── Kiosk cart manipulation
//! ├── order.rs      ◄─── Checkout, submission, tracking, admin boards
//! ├── auth.rs       ◄─── Admin login
//! ├── inventory.rs  ◄─── Stock, availability, prices
//! ├── settings.rs   ◄─── Pricing and feature flags
//! ├── reports.rs    ◄─── Dashboard, daily summary, funnel metrics
//! └── changes.rs    ◄─── Server-sent change stream
//! ```
//!
//! ## State Injection
//! Each handler declares only the substates it needs:
//! ```rust,ignore
//! // Only needs the cart
//! async fn get_cart(State(cart): State<CartState>, ...)
//!
//! // Admin route: the session extractor rejects missing or bad tokens
//! async fn dashboard(_admin: AdminSession, State(live): State<LiveState>, ...)
//! ```

pub mod auth;
pub mod cart;
pub mod changes;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod order;
pub mod reports;
pub mod settings;

use kiosk_core::{Category, ValidationError};

/// Parses an optional `category` query value. Empty and `all` mean no filter.
pub(crate) fn parse_category(raw: Option<&str>) -> Result<Option<Category>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category(None).unwrap(), None);
        assert_eq!(parse_category(Some("all")).unwrap(), None);
        assert_eq!(parse_category(Some("coffee")).unwrap(), Some(Category::Coffee));
        assert!(parse_category(Some("tea")).is_err());
    }
}
