//! # Cart Handlers
//!
//! The kiosk's cart lives on the server; every change returns the full
//! cart view so the screen can redraw from one response.
//!
//! Lines are addressed by their variant key (product, milk, size), the
//! same key the cart merges on.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{CartState, DbState};
use kiosk_core::{
    AddOn, AppSettings, Cart, CartItem, CartTotals, CoreError, DrinkSize, MilkType, OrderExtras, VariantKey,
};

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Cart contents plus totals priced against the current settings.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub extras: OrderExtras,
    pub totals: CartTotals,
}

impl CartView {
    pub fn build(cart: &Cart, settings: &AppSettings) -> Self {
        CartView {
            items: cart
                .items
                .iter()
                .map(|item| CartLineView {
                    unit_price_cents: item.unit_price(settings).cents(),
                    line_total_cents: item.line_total(settings).cents(),
                    item: item.clone(),
                })
                .collect(),
            extras: cart.extras,
            totals: cart.totals(settings),
        }
    }
}

async fn view(db: &DbState, cart: &CartState) -> Result<Json<CartView>, ApiError> {
    let settings = db.inner().settings().get().await?;
    Ok(Json(cart.with_cart(|c| CartView::build(c, &settings))))
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub milk: Option<MilkType>,
    #[serde(default)]
    pub size: Option<DrinkSize>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    #[serde(flatten)]
    pub key: VariantKey,
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    #[serde(flatten)]
    pub key: VariantKey,
    pub quantity: i64,
}

/// Add-on flags to change; absent flags keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct AddOnsRequest {
    pub collagen: Option<bool>,
    pub ashwagandha: Option<bool>,
    pub honey: Option<bool>,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn get_cart(State(db): State<DbState>, State(cart): State<CartState>) -> Result<Json<CartView>, ApiError> {
    view(&db, &cart).await
}

/// Adds one unit of a product variant, merging with an identical line.
pub async fn add_item(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let product = db
        .inner()
        .products()
        .get_by_id(&request.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

    cart.with_cart_mut(|c| c.add_item(&product, request.milk, request.size))?;
    debug!(product_id = %product.id, milk = ?request.milk, size = ?request.size, "Item added to cart");

    view(&db, &cart).await
}

/// Changes a line by `delta`; reaching zero removes it.
pub async fn adjust_quantity(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Json(request): Json<AdjustQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    cart.with_cart_mut(|c| c.adjust_quantity(&request.key, request.delta))?;
    view(&db, &cart).await
}

pub async fn set_quantity(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    cart.with_cart_mut(|c| c.set_quantity(&request.key, request.quantity))?;
    view(&db, &cart).await
}

pub async fn remove_item(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Json(key): Json<VariantKey>,
) -> Result<Json<CartView>, ApiError> {
    cart.with_cart_mut(|c| c.remove_item(&key))?;
    view(&db, &cart).await
}

pub async fn set_add_ons(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Json(request): Json<AddOnsRequest>,
) -> Result<Json<CartView>, ApiError> {
    cart.with_cart_mut(|c| {
        for (add_on, flag) in [
            (AddOn::Collagen, request.collagen),
            (AddOn::Ashwagandha, request.ashwagandha),
            (AddOn::Honey, request.honey),
        ] {
            if let Some(enabled) = flag {
                c.set_add_on(add_on, enabled);
            }
        }
    });
    view(&db, &cart).await
}

pub async fn clear_cart(
    State(db): State<DbState>,
    State(cart): State<CartState>,
) -> Result<Json<CartView>, ApiError> {
    cart.with_cart_mut(Cart::clear);
    debug!("Cart cleared");
    view(&db, &cart).await
}
