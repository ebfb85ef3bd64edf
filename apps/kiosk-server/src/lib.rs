//! # Matcha Kiosk Server
//!
//! HTTP backend for the café's self-service kiosk and its admin dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kiosk Server                                    │
//! │                                                                         │
//! │  Kiosk (public)              Admin (Bearer JWT)                         │
//! │  ──────────────              ──────────────────                         │
//! │  /api/menu                   /api/admin/orders[...]                     │
//! │  /api/cart[...]              /api/admin/inventory[...]                  │
//! │  /api/checkout               /api/admin/settings                        │
//! │  /api/orders[...]            /api/admin/dashboard                       │
//! │                              /api/admin/changes        (SSE)            │
//! │                              /api/admin/reports/daily-summary ─► Resend │
//! │                              /api/admin/metrics ──────────────► PostHog │
//! │          │                              │                               │
//! │          └──────────────┬───────────────┘                               │
//! │                         ▼                                               │
//! │         kiosk-core (pricing, workflow, reports)                         │
//! │         kiosk-db   (SQLite, change feed)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]. Every setting has a default except the
//! Resend and PostHog keys; without them the two endpoints that need them
//! answer with a configuration error.

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::commands::{auth as login, cart, changes, health, inventory, menu, order, reports, settings};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,kiosk=debug,sqlx=warn,tower_http=debug";

/// Installs the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

// =============================================================================
// Router
// =============================================================================

/// Builds the complete router with middleware and state.
pub fn build_router(state: AppState) -> Router {
    let kiosk = Router::new()
        .route("/menu", get(menu::list_menu))
        .route("/settings", get(menu::get_settings))
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route(
            "/cart/items",
            post(cart::add_item)
                .patch(cart::adjust_quantity)
                .put(cart::set_quantity)
                .delete(cart::remove_item),
        )
        .route("/cart/add-ons", put(cart::set_add_ons))
        .route("/checkout", post(order::checkout))
        .route("/orders", post(order::submit_order))
        .route("/orders/{id}/track", get(order::track_order));

    let admin = Router::new()
        .route("/login", post(login::login))
        .route("/orders", get(order::list_orders))
        .route("/orders/today", get(order::list_today))
        .route("/orders/history", get(order::history))
        .route("/orders/{id}", get(order::get_order))
        .route("/orders/{id}/status", post(order::update_status))
        .route("/orders/{id}/advance", post(order::advance_order))
        .route("/orders/{id}/cancel", post(order::cancel_order))
        .route("/inventory", get(inventory::list_inventory))
        .route("/inventory/low-stock", get(inventory::list_low_stock))
        .route("/inventory/{id}/stock", put(inventory::set_stock))
        .route("/inventory/{id}/stock/adjust", post(inventory::adjust_stock))
        .route("/inventory/{id}/availability", post(inventory::toggle_availability))
        .route("/inventory/{id}/price", put(inventory::set_price))
        .route("/settings", put(settings::update_settings))
        .route("/dashboard", get(reports::dashboard))
        .route("/changes", get(changes::change_stream))
        .route("/reports/daily-summary", post(reports::send_daily_summary))
        .route("/metrics", get(reports::funnel_metrics));

    let cors = cors_layer(&state.config.config().server.cors_origin);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", kiosk)
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the kiosk and dashboard frontends. `*` allows any origin.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(600));

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, cross-origin requests will be refused");
            layer
        }
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::state::AppState;
    use kiosk_core::{Category, NewProduct};
    use kiosk_db::{Database, DbConfig};

    fn product(id: &str, name_key: &str, category: Category, price_cents: i64, requires_milk: bool, stock: i64) -> NewProduct {
        NewProduct {
            id: Some(id.to_string()),
            name_key: name_key.to_string(),
            category,
            price_cents,
            image_url: String::new(),
            requires_milk,
            stock,
            low_stock_threshold: Some(5),
            is_available: None,
        }
    }

    /// In-memory state with three products:
    /// `1` matchaLatte (milk, 550), `11` espresso (350, low stock),
    /// `17` cookie (sweets, unavailable, out of stock).
    pub async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        products
            .insert(&product("1", "matchaLatte", Category::Matcha, 550, true, 20))
            .await
            .unwrap();
        products
            .insert(&product("11", "espresso", Category::Coffee, 350, false, 3))
            .await
            .unwrap();
        let mut cookie = product("17", "cookie", Category::Sweets, 299, false, 0);
        cookie.is_available = Some(false);
        products.insert(&cookie).await.unwrap();

        AppState::new(db, ServerConfig::default()).await.unwrap()
    }

    pub async fn test_app() -> (Router, AppState) {
        let state = test_state().await;
        (crate::build_router(state.clone()), state)
    }

    pub fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        request(Method::GET, uri)
    }

    pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn with_token(mut request: Request<Body>, token: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        request
    }

    /// Sends one request; the body is parsed as JSON (`Null` when empty).
    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Creates an admin account and returns a valid access token for it.
    pub async fn admin_token(state: &AppState) -> String {
        let admin = state
            .db
            .inner()
            .admins()
            .create_with_password("barista@matcha.cafe", "matcha-admin-1")
            .await
            .unwrap();
        state.auth.jwt().generate_access_token(&admin).unwrap()
    }
}
