//! # Cart
//!
//! The kiosk cart: line items keyed by (product, milk, size) plus the
//! order-wide add-ons.
//!
//! ## Merge Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Variant Key Merging                                  │
//! │                                                                         │
//! │  add(matchaLatte, oat, large)    ──► new line   [latte/oat/large ×1]    │
//! │  add(matchaLatte, oat, large)    ──► merge      [latte/oat/large ×2]    │
//! │  add(matchaLatte, almond, large) ──► new line   [latte/almond/large ×1] │
//! │  add(espresso)                   ──► new line   [espresso ×1]           │
//! │  add(espresso)                   ──► merge      [espresso ×2]           │
//! │                                                                         │
//! │  Milk-less products are keyed by product id alone (size dropped).       │
//! │  Milk without a size is normalised to regular.                          │
//! │                                                                         │
//! │  adjust(key, -1) on a ×1 line   ──► line pruned (qty ≤ 0 never stays)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are not frozen here: totals are computed against the current
//! [`AppSettings`] and the base price captured when the line was added.
//! The server re-prices everything at submission (see [`crate::pricing`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{self, OrderTotals};
use crate::types::{AddOn, AppSettings, Category, DrinkSize, MilkType, NewOrder, NewOrderItem, OrderExtras, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Variant Key
// =============================================================================

/// Identity of a cart line for merge purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VariantKey {
    pub product_id: String,
    #[serde(default)]
    pub milk: Option<MilkType>,
    #[serde(default)]
    pub size: Option<DrinkSize>,
}

impl VariantKey {
    /// Builds a normalised key.
    ///
    /// ```rust
    /// use kiosk_core::{DrinkSize, MilkType, VariantKey};
    ///
    /// let espresso = VariantKey::new("10", None, Some(DrinkSize::Large));
    /// assert_eq!(espresso.size, None);
    ///
    /// let latte = VariantKey::new("1", Some(MilkType::Oat), None);
    /// assert_eq!(latte.size, Some(DrinkSize::Regular));
    /// ```
    pub fn new(product_id: impl Into<String>, milk: Option<MilkType>, size: Option<DrinkSize>) -> Self {
        let size = match milk {
            Some(_) => Some(size.unwrap_or_default()),
            None => None,
        };
        VariantKey {
            product_id: product_id.into(),
            milk,
            size,
        }
    }

    /// Re-normalises a key that arrived from the outside.
    pub fn normalized(self) -> Self {
        VariantKey::new(self.product_id, self.milk, self.size)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.product_id)?;
        if let Some(milk) = self.milk {
            write!(f, "/{:?}", milk)?;
        }
        if let Some(size) = self.size {
            write!(f, "/{:?}", size)?;
        }
        Ok(())
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// Carries a snapshot of the product fields the kiosk needs to render the
/// line without another lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub name_key: String,
    pub category: Category,
    /// Base price captured when the line was added.
    pub base_price_cents: i64,
    pub quantity: i64,
    pub milk: Option<MilkType>,
    pub size: Option<DrinkSize>,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    fn from_product(product: &Product, key: &VariantKey) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name_key: product.name_key.clone(),
            category: product.category,
            base_price_cents: product.price_cents,
            quantity: 1,
            milk: key.milk,
            size: key.size,
            added_at: Utc::now(),
        }
    }

    pub fn key(&self) -> VariantKey {
        VariantKey {
            product_id: self.product_id.clone(),
            milk: self.milk,
            size: self.size,
        }
    }

    fn matches(&self, key: &VariantKey) -> bool {
        self.product_id == key.product_id && self.milk == key.milk && self.size == key.size
    }

    /// Unit price including the size surcharge.
    pub fn unit_price(&self, settings: &AppSettings) -> Money {
        pricing::unit_price(Money::from_cents(self.base_price_cents), self.size, settings)
    }

    pub fn line_total(&self, settings: &AppSettings) -> Money {
        pricing::line_subtotal(self.unit_price(settings), self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The kiosk cart.
///
/// ## Invariants
/// - Lines are unique by variant key
/// - Every line has quantity in 1..=MAX_ITEM_QUANTITY
/// - At most MAX_CART_ITEMS lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub extras: OrderExtras,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            extras: OrderExtras::default(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of a product variant.
    ///
    /// ## Behavior
    /// - Same variant already in cart: quantity + 1
    /// - Otherwise: new line with quantity 1
    ///
    /// ## Errors
    /// Unavailable product, milk rule violation, line or quantity limits.
    pub fn add_item(
        &mut self,
        product: &Product,
        milk: Option<MilkType>,
        size: Option<DrinkSize>,
    ) -> CoreResult<()> {
        pricing::check_orderable(product, milk)?;
        let key = VariantKey::new(product.id.clone(), milk, size);

        if let Some(item) = self.items.iter_mut().find(|i| i.matches(&key)) {
            let new_qty = item.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem::from_product(product, &key));
        Ok(())
    }

    /// Increments or decrements a line by `delta`.
    ///
    /// A resulting quantity of zero or less removes the line.
    pub fn adjust_quantity(&mut self, key: &VariantKey, delta: i64) -> CoreResult<()> {
        let key = key.clone().normalized();
        let item = self
            .items
            .iter_mut()
            .find(|i| i.matches(&key))
            .ok_or_else(|| CoreError::LineNotInCart(key.to_string()))?;

        match item.quantity.checked_add(delta) {
            Some(new_qty) if new_qty > MAX_ITEM_QUANTITY => {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            Some(new_qty) => item.quantity = new_qty,
            // Overflow upward is a request for too many.
            None if delta > 0 => {
                return Err(CoreError::QuantityTooLarge {
                    requested: i64::MAX,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            None => item.quantity = 0,
        }

        self.items.retain(|i| i.quantity > 0);
        Ok(())
    }

    /// Sets a line's quantity. Zero (or less) removes the line.
    pub fn set_quantity(&mut self, key: &VariantKey, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(key);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let key = key.clone().normalized();
        let item = self
            .items
            .iter_mut()
            .find(|i| i.matches(&key))
            .ok_or_else(|| CoreError::LineNotInCart(key.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by variant key.
    pub fn remove_item(&mut self, key: &VariantKey) -> CoreResult<()> {
        let key = key.clone().normalized();
        let initial_len = self.items.len();
        self.items.retain(|i| !i.matches(&key));

        if self.items.len() == initial_len {
            Err(CoreError::LineNotInCart(key.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn set_add_on(&mut self, add_on: AddOn, enabled: bool) {
        self.extras.set(add_on, enabled);
    }

    pub fn toggle_add_on(&mut self, add_on: AddOn) {
        let current = self.extras.is_selected(add_on);
        self.extras.set(add_on, !current);
    }

    /// Empties the cart and resets add-ons.
    pub fn clear(&mut self) {
        self.items.clear();
        self.extras = OrderExtras::default();
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Computes totals against the current settings.
    pub fn totals(&self, settings: &AppSettings) -> CartTotals {
        let subtotal: Money = self.items.iter().map(|i| i.line_total(settings)).sum();
        let extras = pricing::extras_total(&self.extras, settings);
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            amounts: OrderTotals::new(subtotal, extras),
        }
    }

    /// Snapshots the cart into an order submission payload.
    ///
    /// Size defaults to regular on lines that have none.
    pub fn to_new_order(&self) -> CoreResult<NewOrder> {
        if self.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        Ok(NewOrder {
            items: self
                .items
                .iter()
                .map(|i| NewOrderItem {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    milk: i.milk,
                    size: i.size.unwrap_or_default(),
                })
                .collect(),
            extra_collagen: self.extras.collagen,
            extra_ashwagandha: self.extras.ashwagandha,
            extra_honey: self.extras.honey,
        })
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    #[serde(flatten)]
    #[ts(flatten)]
    pub amounts: OrderTotals,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, requires_milk: bool) -> Product {
        Product {
            id: id.to_string(),
            name_key: format!("product{}", id),
            category: if requires_milk { Category::Matcha } else { Category::Coffee },
            price_cents,
            image_url: String::new(),
            is_available: true,
            stock: 20,
            low_stock_threshold: 5,
            requires_milk,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_same_variant() {
        let mut cart = Cart::new();
        let latte = test_product("1", 550, true);

        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Large)).unwrap();
        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Large)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_different_milk_is_a_new_line() {
        let mut cart = Cart::new();
        let latte = test_product("1", 550, true);

        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Regular)).unwrap();
        cart.add_item(&latte, Some(MilkType::Almond), Some(DrinkSize::Regular)).unwrap();
        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Large)).unwrap();

        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_milkless_product_keyed_by_id() {
        let mut cart = Cart::new();
        let espresso = test_product("10", 250, false);

        cart.add_item(&espresso, None, None).unwrap();
        cart.add_item(&espresso, None, Some(DrinkSize::Large)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.items[0].size, None);
    }

    #[test]
    fn test_milk_rules_enforced_on_add() {
        let mut cart = Cart::new();
        let latte = test_product("1", 550, true);
        let espresso = test_product("10", 250, false);

        assert!(matches!(
            cart.add_item(&latte, None, None),
            Err(CoreError::MilkRequired { .. })
        ));
        assert!(matches!(
            cart.add_item(&espresso, Some(MilkType::Oat), None),
            Err(CoreError::MilkNotAllowed { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unavailable_product_rejected() {
        let mut cart = Cart::new();
        let mut espresso = test_product("10", 250, false);
        espresso.is_available = false;

        assert!(matches!(
            cart.add_item(&espresso, None, None),
            Err(CoreError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn test_decrement_to_zero_prunes_line() {
        let mut cart = Cart::new();
        let espresso = test_product("10", 250, false);
        cart.add_item(&espresso, None, None).unwrap();

        let key = VariantKey::new("10", None, None);
        cart.adjust_quantity(&key, 1).unwrap();
        assert_eq!(cart.total_quantity(), 2);

        cart.adjust_quantity(&key, -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_large_negative_delta_never_leaves_negative_quantity() {
        let mut cart = Cart::new();
        let espresso = test_product("10", 250, false);
        cart.add_item(&espresso, None, None).unwrap();

        cart.adjust_quantity(&VariantKey::new("10", None, None), -5).unwrap();
        assert!(cart.items.iter().all(|i| i.quantity > 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_extreme_deltas_do_not_overflow() {
        let mut cart = Cart::new();
        let espresso = test_product("10", 250, false);
        cart.add_item(&espresso, None, None).unwrap();
        let key = VariantKey::new("10", None, None);

        assert!(matches!(
            cart.adjust_quantity(&key, i64::MAX),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(cart.total_quantity(), 1);

        cart.adjust_quantity(&key, i64::MIN).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_missing_line_errors() {
        let mut cart = Cart::new();
        let result = cart.adjust_quantity(&VariantKey::new("404", None, None), 1);
        assert!(matches!(result, Err(CoreError::LineNotInCart(_))));
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        let latte = test_product("1", 550, true);
        cart.add_item(&latte, Some(MilkType::Coconut), None).unwrap();

        // Key arrives without size; normalisation fills in regular
        let key = VariantKey {
            product_id: "1".to_string(),
            milk: Some(MilkType::Coconut),
            size: None,
        };
        cart.set_quantity(&key, 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);

        assert!(matches!(
            cart.set_quantity(&key, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));

        cart.set_quantity(&key, 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove_item(&key).is_err());
    }

    #[test]
    fn test_totals_with_size_and_add_ons() {
        let mut cart = Cart::new();
        let settings = AppSettings::default();
        let latte = test_product("1", 550, true);
        let sandwich = test_product("16", 1099, false);

        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Large)).unwrap();
        cart.add_item(&latte, Some(MilkType::Oat), Some(DrinkSize::Large)).unwrap();
        cart.add_item(&sandwich, None, None).unwrap();
        cart.set_add_on(AddOn::Honey, true);
        cart.toggle_add_on(AddOn::Collagen);
        cart.toggle_add_on(AddOn::Collagen);

        let totals = cart.totals(&settings);
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.amounts.subtotal_cents, 1300 + 1099);
        assert_eq!(totals.amounts.extras_total_cents, 100);
        assert_eq!(
            totals.amounts.total_cents,
            totals.amounts.subtotal_cents + totals.amounts.extras_total_cents
        );
    }

    #[test]
    fn test_clear_resets_add_ons() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("10", 250, false), None, None).unwrap();
        cart.set_add_on(AddOn::Ashwagandha, true);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.extras, OrderExtras::default());
    }

    #[test]
    fn test_to_new_order() {
        let mut cart = Cart::new();
        assert!(matches!(cart.to_new_order(), Err(CoreError::EmptyOrder)));

        cart.add_item(&test_product("1", 550, true), Some(MilkType::Oat), Some(DrinkSize::Large))
            .unwrap();
        cart.add_item(&test_product("10", 250, false), None, None).unwrap();
        cart.set_add_on(AddOn::Collagen, true);

        let order = cart.to_new_order().unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].size, DrinkSize::Large);
        assert_eq!(order.items[1].size, DrinkSize::Regular);
        assert_eq!(order.items[1].milk, None);
        assert!(order.extra_collagen);
        assert!(!order.extra_honey);
    }
}
