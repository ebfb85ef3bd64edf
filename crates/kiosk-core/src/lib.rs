//! # kiosk-core: Pure Business Logic for the Café Kiosk
//!
//! This crate is the **heart** of the kiosk. It contains the cart, pricing,
//! order workflow and inventory rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kiosk Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Kiosk touchscreen / Admin dashboard                │   │
//! │  │    Menu ──► Cart ──► Checkout ──► Order number                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (kiosk-server)                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kiosk-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐  │   │
//! │  │   │  cart   │ │ pricing │ │ workflow │ │inventory │ │reports│  │   │
//! │  │   │ variant │ │ size +  │ │ pending→ │ │ clamp ≥0 │ │ stats │  │   │
//! │  │   │  merge  │ │ add-ons │ │ complete │ │ low stock│ │summary│  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kiosk-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, AppSettings, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart lines keyed by (product, milk, size)
//! - [`pricing`] - Unit prices, add-ons, order totals
//! - [`workflow`] - Order status state machine
//! - [`inventory`] - Stock clamping, low-stock checks, menu ordering
//! - [`reports`] - Dashboard stats, history filters, daily summary, funnel
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kiosk_core::{pricing, AppSettings, DrinkSize, Money};
//!
//! let settings = AppSettings::default();
//!
//! // A $5.50 latte in large costs $1.00 more
//! let unit = pricing::unit_price(Money::from_cents(550), Some(DrinkSize::Large), &settings);
//! assert_eq!(unit.cents(), 650);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod reports;
pub mod types;
pub mod validation;
pub mod workflow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kiosk_core::Money` instead of
// `use kiosk_core::money::Money`

pub use cart::{Cart, CartItem, CartTotals, VariantKey};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{OrderTotals, PricedLine, PricedOrder};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart or order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering on a touchscreen (tapping "+" in a loop).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest stock count a product can hold.
pub const MAX_STOCK: i64 = 1_000_000;

/// Largest base price or surcharge, in cents ($10,000.00).
///
/// Keeps every cart and order total far from `i64` overflow.
pub const MAX_PRICE_CENTS: i64 = 1_000_000;

/// Prefix of human-readable order numbers ("M001").
pub const ORDER_NUMBER_PREFIX: &str = "M";

/// Low-stock threshold given to products that don't specify one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// How many orders the dashboard shows as "recent".
pub const RECENT_ORDERS_LIMIT: usize = 5;

/// How many products the daily summary ranks.
pub const TOP_PRODUCTS_LIMIT: usize = 5;
