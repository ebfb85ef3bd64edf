//! # Inventory Rules
//!
//! Stock and price adjustments plus the product views built on them.
//!
//! Staff type numbers into the dashboard, so inputs are clamped rather
//! than rejected: a stock of -3 becomes 0, never an error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Category, Product};
use crate::MAX_STOCK;

/// Stock can't go below zero.
#[inline]
pub fn clamp_stock(stock: i64) -> i64 {
    stock.max(0)
}

/// Applies a delta to current stock, kept within `0..=MAX_STOCK`.
///
/// ```rust
/// use kiosk_core::inventory::adjusted_stock;
///
/// assert_eq!(adjusted_stock(10, -3), 7);
/// assert_eq!(adjusted_stock(2, -5), 0);
/// ```
#[inline]
pub fn adjusted_stock(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).clamp(0, MAX_STOCK)
}

/// Prices can't go below zero.
#[inline]
pub fn clamp_price(cents: i64) -> i64 {
    cents.max(0)
}

/// Products whose stock has dropped under their threshold.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

/// Filter for the admin inventory screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryQuery {
    /// `None` means every category.
    #[serde(default)]
    pub category: Option<Category>,
    /// Case-insensitive substring of `name_key`. Empty matches all.
    #[serde(default)]
    pub search: String,
}

impl InventoryQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }

        let needle = self.search.trim();
        needle.is_empty() || product.name_key.to_lowercase().contains(&needle.to_lowercase())
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

/// What customers see: available products, by category then name key.
pub fn menu_order(products: &[Product]) -> Vec<Product> {
    let mut menu: Vec<Product> = products.iter().filter(|p| p.is_available).cloned().collect();
    menu.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name_key.cmp(&b.name_key)));
    menu
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name_key: &str, category: Category, stock: i64, available: bool) -> Product {
        Product {
            id: id.to_string(),
            name_key: name_key.to_string(),
            category,
            price_cents: 450,
            image_url: String::new(),
            is_available: available,
            stock,
            low_stock_threshold: 10,
            requires_milk: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("16", "sandwichVegano", Category::Snacks, 4, true),
            product("10", "espresso", Category::Coffee, 30, true),
            product("1", "matchaLatte", Category::Matcha, 10, true),
            product("6", "matchaLimonada", Category::Matcha, 9, false),
            product("11", "americano", Category::Coffee, 0, true),
        ]
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_stock(-3), 0);
        assert_eq!(clamp_stock(12), 12);
        assert_eq!(clamp_price(-1), 0);
        assert_eq!(adjusted_stock(5, i64::MAX), MAX_STOCK);
        assert_eq!(adjusted_stock(5, i64::MIN), 0);
    }

    #[test]
    fn test_low_stock_is_strictly_below_threshold() {
        let products = catalog();
        let ids: Vec<&str> = low_stock(&products).iter().map(|p| p.id.as_str()).collect();
        // matchaLatte sits exactly at its threshold and is not low
        assert_eq!(ids, vec!["16", "6", "11"]);
    }

    #[test]
    fn test_inventory_query() {
        let products = catalog();

        let all = InventoryQuery::default();
        assert_eq!(all.apply(&products).len(), 5);

        let matcha = InventoryQuery {
            category: Some(Category::Matcha),
            search: String::new(),
        };
        assert_eq!(matcha.apply(&products).len(), 2);

        let search = InventoryQuery {
            category: None,
            search: "  MATCHA ".to_string(),
        };
        assert_eq!(search.apply(&products).len(), 2);

        let none = InventoryQuery {
            category: Some(Category::Coffee),
            search: "latte".to_string(),
        };
        assert!(none.apply(&products).is_empty());
    }

    #[test]
    fn test_menu_order_hides_unavailable_and_sorts() {
        let menu = menu_order(&catalog());
        let keys: Vec<&str> = menu.iter().map(|p| p.name_key.as_str()).collect();
        assert_eq!(keys, vec!["matchaLatte", "americano", "espresso", "sandwichVegano"]);
    }
}
