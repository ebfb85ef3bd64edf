//! # Menu Handlers
//!
//! Public read endpoints the kiosk loads on start.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use super::parse_category;
use crate::error::ApiError;
use crate::state::DbState;
use kiosk_core::inventory::menu_order;
use kiosk_core::{AppSettings, Product};

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// Available products, by category then name key.
pub async fn list_menu(
    State(db): State<DbState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let category = parse_category(query.category.as_deref())?;
    let products = db.inner().products().list_available().await?;

    let menu: Vec<Product> = menu_order(&products)
        .into_iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .collect();

    debug!(count = menu.len(), ?category, "Menu listed");
    Ok(Json(menu))
}

pub async fn get_settings(State(db): State<DbState>) -> Result<Json<AppSettings>, ApiError> {
    Ok(Json(db.inner().settings().get().await?))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_menu_hides_unavailable() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, get("/api/menu")).await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name_key"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["matchaLatte", "espresso"]);
    }

    #[tokio::test]
    async fn test_menu_category_filter() {
        let (app, _) = test_app().await;
        let (_, body) = send(&app, get("/api/menu?category=coffee")).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "11");

        let (status, body) = send(&app, get("/api/menu?category=tea")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_settings_defaults() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, get("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["large_size_extra_cents"], 100);
        assert_eq!(body["sweets_coming_soon"], true);
    }
}
