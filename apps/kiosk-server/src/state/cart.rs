//! # Cart State
//!
//! The kiosk's single active cart.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because:
//! 1. Several handlers read and modify it
//! 2. Only one request should modify it at a time
//! 3. axum runs handlers concurrently
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Kiosk Action            Route                     Cart Change          │
//! │  ────────────            ─────                     ───────────          │
//! │  Tap product ──────────► POST   /api/cart/items ─► add_item()          │
//! │  + / - ────────────────► PATCH  /api/cart/items ─► adjust_quantity()   │
//! │  Remove ───────────────► DELETE /api/cart/items ─► remove_item()       │
//! │  Add-on switch ────────► PUT    /api/cart/add-ons► set_add_on()        │
//! │  Pay ──────────────────► POST   /api/checkout ───► clear() on success  │
//! │                                                                         │
//! │  NOTE: the lock is never held across an `.await`.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use kiosk_core::Cart;

#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // A panic mid-update leaves a structurally valid cart
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| cart.totals(&settings));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, milk, size))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock();
        f(&mut cart)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}
