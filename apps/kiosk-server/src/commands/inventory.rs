//! # Inventory Handlers
//!
//! Stock, availability and base prices. Reads come from the live products
//! snapshot; writes go to the database and then refresh the snapshot so
//! the response and the next read agree.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::parse_category;
use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::{DbState, LiveState};
use kiosk_core::inventory::{low_stock, InventoryQuery};
use kiosk_core::validation::validate_search_query;
use kiosk_core::Product;
use kiosk_db::ChangeTable;

#[derive(Debug, Default, Deserialize)]
pub struct InventoryParams {
    pub category: Option<String>,
    #[serde(default)]
    pub search: String,
}

pub async fn list_inventory(
    _admin: AdminSession,
    State(live): State<LiveState>,
    Query(params): Query<InventoryParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let query = InventoryQuery {
        category: parse_category(params.category.as_deref())?,
        search: validate_search_query(&params.search)?,
    };
    let products = live
        .with_products(|products| query.apply(products).into_iter().cloned().collect())
        .await;
    Ok(Json(products))
}

pub async fn list_low_stock(_admin: AdminSession, State(live): State<LiveState>) -> Json<Vec<Product>> {
    let mut products: Vec<Product> = live
        .with_products(|products| low_stock(products).into_iter().cloned().collect())
        .await;
    products.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name_key.cmp(&b.name_key)));
    Json(products)
}

async fn refreshed(db: &DbState, live: &LiveState, product: Product) -> Result<Json<Product>, ApiError> {
    live.reload(db.inner(), ChangeTable::Products).await?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock: i64,
}

/// Sets stock to an absolute count; negative input is stored as zero.
pub async fn set_stock(
    admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().set_stock(&id, request.stock).await?;
    info!(product_id = %id, stock = product.stock, admin = %admin.0.email, "Stock set");
    refreshed(&db, &live, product).await
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

pub async fn adjust_stock(
    _admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().adjust_stock(&id, request.delta).await?;
    refreshed(&db, &live, product).await
}

pub async fn toggle_availability(
    _admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().toggle_availability(&id).await?;
    info!(product_id = %id, available = product.is_available, "Availability toggled");
    refreshed(&db, &live, product).await
}

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    pub price_cents: i64,
}

/// Sets the base price; negative input is stored as zero.
pub async fn set_price(
    _admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
    Json(request): Json<SetPriceRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().set_price(&id, request.price_cents).await?;
    refreshed(&db, &live, product).await
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_inventory_filters() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let (_, all) = send(&app, with_token(get("/api/admin/inventory"), &token)).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (_, sweets) = send(&app, with_token(get("/api/admin/inventory?category=sweets"), &token)).await;
        assert_eq!(sweets.as_array().unwrap().len(), 1);
        assert_eq!(sweets[0]["id"], "17");

        let (_, found) = send(&app, with_token(get("/api/admin/inventory?search=LATTE"), &token)).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name_key"], "matchaLatte");

        let uri = format!("/api/admin/inventory?search={}", "a".repeat(101));
        let (status, body) = send(&app, with_token(get(&uri), &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_low_stock_list() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(&app, with_token(get("/api/admin/inventory/low-stock"), &token)).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["17", "11"]);
    }

    #[tokio::test]
    async fn test_stock_writes_clamp_and_refresh() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            with_token(json_request(Method::PUT, "/api/admin/inventory/11/stock", json!({ "stock": -4 })), &token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock"], 0);

        let (_, body) = send(
            &app,
            with_token(
                json_request(Method::POST, "/api/admin/inventory/11/stock/adjust", json!({ "delta": 12 })),
                &token,
            ),
        )
        .await;
        assert_eq!(body["stock"], 12);

        let (_, body) = send(
            &app,
            with_token(
                json_request(Method::POST, "/api/admin/inventory/11/stock/adjust", json!({ "delta": -20 })),
                &token,
            ),
        )
        .await;
        assert_eq!(body["stock"], 0);

        let (_, low) = send(&app, with_token(get("/api/admin/inventory/low-stock"), &token)).await;
        let espresso = low.as_array().unwrap().iter().find(|p| p["id"] == "11").unwrap();
        assert_eq!(espresso["stock"], 0);
    }

    #[tokio::test]
    async fn test_oversized_writes_rejected() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            with_token(
                json_request(Method::POST, "/api/admin/inventory/11/stock/adjust", json!({ "delta": i64::MAX })),
                &token,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            with_token(
                json_request(Method::PUT, "/api/admin/inventory/11/price", json!({ "price_cents": i64::MAX })),
                &token,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, menu) = send(&app, get("/api/menu")).await;
        assert_eq!(status, StatusCode::OK);
        let espresso = menu.as_array().unwrap().iter().find(|p| p["id"] == "11").unwrap();
        assert_eq!(espresso["stock"], 3);
        assert_eq!(espresso["price_cents"], 350);
    }

    #[tokio::test]
    async fn test_availability_and_price() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let (_, body) = send(
            &app,
            with_token(request(Method::POST, "/api/admin/inventory/11/availability"), &token),
        )
        .await;
        assert_eq!(body["is_available"], false);

        let (_, menu) = send(&app, get("/api/menu")).await;
        assert_eq!(menu.as_array().unwrap().len(), 1);

        let (_, body) = send(
            &app,
            with_token(json_request(Method::PUT, "/api/admin/inventory/1/price", json!({ "price_cents": -1 })), &token),
        )
        .await;
        assert_eq!(body["price_cents"], 0);

        let (status, _) = send(
            &app,
            with_token(request(Method::POST, "/api/admin/inventory/404/availability"), &token),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
