//! # Pricing
//!
//! Turns menu prices, sizes and add-ons into order totals.
//!
//! ## Price Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  unit price   = product base price                                      │
//! │               + large_size_extra        (only when size = large)        │
//! │                                                                         │
//! │  line total   = unit price × quantity                                   │
//! │  subtotal     = Σ line totals                                           │
//! │                                                                         │
//! │  extras total = collagen? + ashwagandha? + honey?   (once per order)    │
//! │                                                                         │
//! │  total        = subtotal + extras total                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Example: 2 × large oat matcha latte (5.50 + 1.00) + honey (1.00)
//! = 13.00 + 1.00 = **$14.00**.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AddOn, AppSettings, DrinkSize, MilkType, NewOrder, OrderExtras, Product};
use crate::validation;

// =============================================================================
// Unit and Line Prices
// =============================================================================

/// Unit price of one drink: base plus the large-size surcharge.
pub fn unit_price(base: Money, size: Option<DrinkSize>, settings: &AppSettings) -> Money {
    match size {
        Some(DrinkSize::Large) => base + Money::from_cents(settings.large_size_extra_cents),
        _ => base,
    }
}

/// Line total: unit price × quantity.
#[inline]
pub fn line_subtotal(unit: Money, quantity: i64) -> Money {
    unit.multiply_quantity(quantity)
}

/// Current price of an add-on.
pub fn add_on_price(add_on: AddOn, settings: &AppSettings) -> Money {
    let cents = match add_on {
        AddOn::Collagen => settings.extra_collagen_price_cents,
        AddOn::Ashwagandha => settings.extra_ashwagandha_price_cents,
        AddOn::Honey => settings.extra_honey_price_cents,
    };
    Money::from_cents(cents)
}

/// Sum of the selected add-ons. Each is charged once per order.
pub fn extras_total(extras: &OrderExtras, settings: &AppSettings) -> Money {
    extras.selected().map(|a| add_on_price(a, settings)).sum()
}

// =============================================================================
// Order Totals
// =============================================================================

/// Derived money fields of an order or cart.
///
/// `total_cents` is always `subtotal_cents + extras_total_cents`; the only
/// constructor enforces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal_cents: i64,
    pub extras_total_cents: i64,
    pub total_cents: i64,
}

impl OrderTotals {
    pub fn new(subtotal: Money, extras_total: Money) -> Self {
        OrderTotals {
            subtotal_cents: subtotal.cents(),
            extras_total_cents: extras_total.cents(),
            total_cents: (subtotal + extras_total).cents(),
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Orderability
// =============================================================================

/// Checks that a product can be ordered with the given milk choice.
///
/// ## Rules
/// - Product must be available
/// - Milk drinks need a milk
/// - Everything else must not carry one
pub fn check_orderable(product: &Product, milk: Option<MilkType>) -> CoreResult<()> {
    if !product.is_available {
        return Err(CoreError::ProductUnavailable(product.name_key.clone()));
    }

    match (product.requires_milk, milk) {
        (true, None) => Err(CoreError::MilkRequired {
            product: product.name_key.clone(),
        }),
        (false, Some(_)) => Err(CoreError::MilkNotAllowed {
            product: product.name_key.clone(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Authoritative Order Pricing
// =============================================================================

/// A priced order line, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub milk: Option<MilkType>,
    pub size: DrinkSize,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Result of pricing a [`NewOrder`] against current products and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub extras: OrderExtras,
    pub totals: OrderTotals,
}

/// Prices an order submission.
///
/// Prices always come from `lookup` (current product rows) and `settings`,
/// never from the client, so a stale kiosk screen can't under-charge.
///
/// ## Errors
/// - `EmptyOrder` when there are no items
/// - `Validation` for bad quantities or too many lines
/// - `ProductNotFound` / `ProductUnavailable` / milk rule violations
pub fn price_order<'a, F>(order: &NewOrder, lookup: F, settings: &AppSettings) -> CoreResult<PricedOrder>
where
    F: Fn(&str) -> Option<&'a Product>,
{
    if order.items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }
    validation::validate_line_count(order.items.len())?;

    let mut lines = Vec::with_capacity(order.items.len());
    let mut subtotal = Money::zero();

    for item in &order.items {
        validation::validate_quantity(item.quantity)?;

        let product = lookup(&item.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
        check_orderable(product, item.milk)?;

        let unit = unit_price(product.price(), Some(item.size), settings);
        let line_total = line_subtotal(unit, item.quantity);
        subtotal += line_total;

        lines.push(PricedLine {
            product_id: product.id.clone(),
            product_name: product.name_key.clone(),
            quantity: item.quantity,
            milk: item.milk,
            size: item.size,
            unit_price_cents: unit.cents(),
            subtotal_cents: line_total.cents(),
        });
    }

    let extras = order.extras();
    let totals = OrderTotals::new(subtotal, extras_total(&extras, settings));

    Ok(PricedOrder {
        lines,
        extras,
        totals,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
