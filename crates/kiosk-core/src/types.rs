//! # Domain Types
//!
//! Core types shared by every layer of the kiosk.
//!
//! ## Entity Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product ─────────────┐                                                 │
//! │  (menu + inventory)   │ snapshot at checkout                            │
//! │                       ▼                                                 │
//! │  Order ──────────► OrderItem*  (name, qty, milk, size, unit, subtotal)  │
//! │    │                                                                    │
//! │    ├── OrderExtras  (collagen / ashwagandha / honey)                    │
//! │    ├── OrderStatus  (pending → preparing → ready → completed)           │
//! │    └── StatusChange* (history)                                          │
//! │                                                                         │
//! │  AppSettings ── large-size surcharge, add-on prices, feature flags      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::ORDER_NUMBER_PREFIX;

// =============================================================================
// Category
// =============================================================================

/// Menu category a product is listed under.
///
/// Declaration order is menu order: the kiosk tabs run matcha → sweets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Matcha,
    Protein,
    Coffee,
    Snacks,
    Sweets,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Matcha,
        Category::Protein,
        Category::Coffee,
        Category::Snacks,
        Category::Sweets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Matcha => "matcha",
            Category::Protein => "protein",
            Category::Coffee => "coffee",
            Category::Snacks => "snacks",
            Category::Sweets => "sweets",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Drink Variants
// =============================================================================

/// Plant milk chosen for drinks that require one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MilkType {
    Oat,
    Almond,
    Coconut,
}

/// Cup size. Large carries the `large_size_extra` surcharge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DrinkSize {
    #[default]
    Regular,
    Large,
}

/// Optional extra applied to the whole order, not per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AddOn {
    Collagen,
    Ashwagandha,
    Honey,
}

impl AddOn {
    pub const ALL: [AddOn; 3] = [AddOn::Collagen, AddOn::Ashwagandha, AddOn::Honey];
}

// =============================================================================
// Product
// =============================================================================

/// A menu item with its inventory fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Translation key for the display name ("matchaLatte").
    pub name_key: String,

    pub category: Category,

    /// Base price in cents (regular size, no add-ons).
    pub price_cents: i64,

    pub image_url: String,

    /// Hidden from the kiosk menu when false.
    pub is_available: bool,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Alert when `stock` drops below this.
    pub low_stock_threshold: i64,

    /// Drinks that must be ordered with a milk choice.
    pub requires_milk: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Stock has fallen under the product's alert threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.low_stock_threshold
    }
}

/// Input for creating a product from the admin screen or the seed binary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    /// Optional explicit id; a UUID is generated when absent.
    pub id: Option<String>,
    pub name_key: String,
    pub category: Category,
    pub price_cents: i64,
    pub image_url: String,
    pub requires_milk: bool,
    pub stock: i64,
    pub low_stock_threshold: Option<i64>,
    pub is_available: Option<bool>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in the counter workflow.
///
/// Transition rules live in [`crate::workflow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted at the kiosk, not yet started.
    #[default]
    Pending,
    /// Staff are making it.
    Preparing,
    /// Waiting at the counter for pickup and payment.
    Ready,
    /// Picked up.
    Completed,
    /// Dropped before completion.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|st| st.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Order
// =============================================================================

/// Add-on flags selected for an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderExtras {
    #[serde(default)]
    pub collagen: bool,
    #[serde(default)]
    pub ashwagandha: bool,
    #[serde(default)]
    pub honey: bool,
}

impl OrderExtras {
    pub fn is_selected(&self, add_on: AddOn) -> bool {
        match add_on {
            AddOn::Collagen => self.collagen,
            AddOn::Ashwagandha => self.ashwagandha,
            AddOn::Honey => self.honey,
        }
    }

    pub fn set(&mut self, add_on: AddOn, enabled: bool) {
        match add_on {
            AddOn::Collagen => self.collagen = enabled,
            AddOn::Ashwagandha => self.ashwagandha = enabled,
            AddOn::Honey => self.honey = enabled,
        }
    }

    /// Iterates the add-ons that are switched on.
    pub fn selected(&self) -> impl Iterator<Item = AddOn> + '_ {
        AddOn::ALL.into_iter().filter(|a| self.is_selected(*a))
    }
}

/// A line of a persisted order.
/// Uses the snapshot pattern: name and prices are frozen at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name key at time of order (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub milk: Option<MilkType>,
    pub size: DrinkSize,
    /// Base price plus size surcharge, in cents (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StatusChange {
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// A submitted order with its items and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable number shown on the kiosk and called at the counter.
    pub order_number: String,
    /// Opaque token returned to the kiosk so it can poll this order.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub kiosk_token: String,
    pub items: Vec<OrderItem>,
    pub extras: OrderExtras,
    pub subtotal_cents: i64,
    pub extras_total_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub status_history: Vec<StatusChange>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total number of units across all lines.
    pub fn item_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Formats a sequence number as an order number: 1 → "M001", 1234 → "M1234".
pub fn format_order_number(sequence: i64) -> String {
    format!("{}{:03}", ORDER_NUMBER_PREFIX, sequence)
}

// =============================================================================
// Order Submission
// =============================================================================

/// One requested line in an order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub milk: Option<MilkType>,
    #[serde(default)]
    pub size: DrinkSize,
}

/// Payload of the atomic "create order with items" call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub extra_collagen: bool,
    #[serde(default)]
    pub extra_ashwagandha: bool,
    #[serde(default)]
    pub extra_honey: bool,
}

impl NewOrder {
    pub fn extras(&self) -> OrderExtras {
        OrderExtras {
            collagen: self.extra_collagen,
            ashwagandha: self.extra_ashwagandha,
            honey: self.extra_honey,
        }
    }
}

/// What the kiosk gets back after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReceipt {
    pub order_id: String,
    pub order_number: String,
    pub kiosk_token: String,
    pub subtotal_cents: i64,
    pub extras_total_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// App Settings
// =============================================================================

/// Global pricing adjustments and feature flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AppSettings {
    /// Sweets tab shows a "coming soon" banner instead of products.
    pub sweets_coming_soon: bool,
    pub large_size_extra_cents: i64,
    pub extra_collagen_price_cents: i64,
    pub extra_ashwagandha_price_cents: i64,
    pub extra_honey_price_cents: i64,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    /// House defaults, used when no settings row has been saved yet.
    fn default() -> Self {
        AppSettings {
            sweets_coming_soon: true,
            large_size_extra_cents: 100,
            extra_collagen_price_cents: 150,
            extra_ashwagandha_price_cents: 150,
            extra_honey_price_cents: 100,
            updated_at: None,
        }
    }
}

/// Partial update of [`AppSettings`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettingsPatch {
    pub sweets_coming_soon: Option<bool>,
    pub large_size_extra_cents: Option<i64>,
    pub extra_collagen_price_cents: Option<i64>,
    pub extra_ashwagandha_price_cents: Option<i64>,
    pub extra_honey_price_cents: Option<i64>,
}

impl SettingsPatch {
    /// Applies the patch, clamping every price at zero.
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(v) = self.sweets_coming_soon {
            settings.sweets_coming_soon = v;
        }
        if let Some(v) = self.large_size_extra_cents {
            settings.large_size_extra_cents = v.max(0);
        }
        if let Some(v) = self.extra_collagen_price_cents {
            settings.extra_collagen_price_cents = v.max(0);
        }
        if let Some(v) = self.extra_ashwagandha_price_cents {
            settings.extra_ashwagandha_price_cents = v.max(0);
        }
        if let Some(v) = self.extra_honey_price_cents {
            settings.extra_honey_price_cents = v.max(0);
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers on the admin overview page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub orders_today: usize,
    pub pending_orders: usize,
    /// Revenue of today's orders, cancelled ones excluded.
    pub revenue_today_cents: i64,
    pub low_stock_products: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        assert_eq!(format_order_number(1), "M001");
        assert_eq!(format_order_number(42), "M042");
        assert_eq!(format_order_number(1234), "M1234");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        assert!("done".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_category_order_is_menu_order() {
        let mut cats = vec![Category::Snacks, Category::Matcha, Category::Coffee];
        cats.sort();
        assert_eq!(cats, vec![Category::Matcha, Category::Coffee, Category::Snacks]);
        assert_eq!("protein".parse::<Category>().unwrap(), Category::Protein);
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&MilkType::Oat).unwrap(), "\"oat\"");
        assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"cancelled\"");
    }

    #[test]
    fn test_new_order_item_size_defaults_to_regular() {
        let item: NewOrderItem =
            serde_json::from_str(r#"{"product_id":"10","quantity":2,"milk":null}"#).unwrap();
        assert_eq!(item.size, DrinkSize::Regular);
        assert_eq!(item.milk, None);
    }

    #[test]
    fn test_settings_patch_clamps_prices() {
        let mut settings = AppSettings::default();
        SettingsPatch {
            large_size_extra_cents: Some(-50),
            extra_honey_price_cents: Some(120),
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.large_size_extra_cents, 0);
        assert_eq!(settings.extra_honey_price_cents, 120);
        assert_eq!(settings.extra_collagen_price_cents, 150);
        assert!(settings.sweets_coming_soon);
    }

    #[test]
    fn test_extras_selected() {
        let extras = OrderExtras {
            collagen: true,
            ashwagandha: false,
            honey: true,
        };
        let selected: Vec<AddOn> = extras.selected().collect();
        assert_eq!(selected, vec![AddOn::Collagen, AddOn::Honey]);
    }
}
