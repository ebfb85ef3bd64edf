//! # Order Handlers
//!
//! Kiosk side: checkout, direct submission and status tracking.
//! Admin side: the counter board, today's list, history, detail and the
//! status workflow.
//!
//! ## Status Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/admin/orders/{id}/status { "status": "ready" }               │
//! │         │                                                               │
//! │         ├─► 1. apply_transition() on the live snapshot copy             │
//! │         │      (board shows the new status immediately)                 │
//! │         ├─► 2. OrderRepository::update_status() in one transaction      │
//! │         ├─► 3. reload the orders snapshot, success or not               │
//! │         │      (a rejected write rolls the optimistic copy back)        │
//! │         └─► 4. respond with the stored order                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::AdminSession;
use crate::error::{ApiError, ErrorCode};
use crate::state::{CartState, ConfigState, DbState, LiveState};
use kiosk_core::reports::{order_history, orders_by_status, today_orders, HistoryRange, StatusFilter};
use kiosk_core::validation::validate_search_query;
use kiosk_core::workflow::apply_transition;
use kiosk_core::{CoreError, NewOrder, Order, OrderReceipt, OrderStatus};
use kiosk_db::ChangeTable;

// =============================================================================
// Kiosk
// =============================================================================

/// Submits the kiosk cart as an order.
///
/// Prices are computed by the server inside the order transaction. The cart
/// is cleared only if nobody changed it while the order was being stored.
pub async fn checkout(
    State(db): State<DbState>,
    State(cart): State<CartState>,
) -> Result<(StatusCode, Json<OrderReceipt>), ApiError> {
    let snapshot = cart.with_cart(|c| c.to_new_order())?;

    let receipt = db.inner().orders().create_order_with_items(&snapshot).await?;

    let cleared = cart.with_cart_mut(|c| {
        let unchanged = c.to_new_order().map_or(false, |current| current == snapshot);
        if unchanged {
            c.clear();
        }
        unchanged
    });

    info!(
        order_number = %receipt.order_number,
        total_cents = receipt.total_cents,
        cleared,
        "Checkout complete"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Stores an order sent as a complete payload.
pub async fn submit_order(
    State(db): State<DbState>,
    Json(new_order): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderReceipt>), ApiError> {
    let receipt = db.inner().orders().create_order_with_items(&new_order).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    #[serde(default)]
    pub token: String,
}

/// Order status for the kiosk that placed it. A wrong token reads as not found.
pub async fn track_order(
    State(db): State<DbState>,
    Path(id): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Order>, ApiError> {
    db.inner()
        .orders()
        .find_for_kiosk(&id, &query.token)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

// =============================================================================
// Admin: Reads
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub status: String,
}

/// Counter board. `all` (the default) lists every active order.
pub async fn list_orders(
    _admin: AdminSession,
    State(live): State<LiveState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let filter: StatusFilter = query.status.parse()?;
    let orders = live
        .with_orders(|orders| orders_by_status(orders, filter).into_iter().cloned().collect())
        .await;
    Ok(Json(orders))
}

pub async fn list_today(
    _admin: AdminSession,
    State(live): State<LiveState>,
    State(config): State<ConfigState>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let now = Utc::now();
    let day = *config.business_day();
    let orders = live
        .with_orders(|orders| today_orders(orders, &day, now).into_iter().cloned().collect())
        .await;
    Ok(Json(orders))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub search: String,
}

/// Completed and cancelled orders, optionally narrowed by date range and
/// order number.
pub async fn history(
    _admin: AdminSession,
    State(live): State<LiveState>,
    State(config): State<ConfigState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let range: HistoryRange = query.range.parse()?;
    let search = validate_search_query(&query.search)?;
    let now = Utc::now();
    let day = *config.business_day();
    let orders = live
        .with_orders(|orders| {
            order_history(orders, range, &search, &day, now)
                .into_iter()
                .cloned()
                .collect()
        })
        .await;
    Ok(Json(orders))
}

pub async fn get_order(
    _admin: AdminSession,
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    db.inner()
        .orders()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

// =============================================================================
// Admin: Workflow
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

async fn transition(
    db: &DbState,
    live: &LiveState,
    id: &str,
    to: OrderStatus,
    note: Option<String>,
) -> Result<Order, ApiError> {
    if let Some(mut local) = live.find_order(id).await {
        if apply_transition(&mut local, to, Utc::now(), note.clone()).is_ok() {
            live.apply_optimistic(&local).await;
        }
    }

    let result = db.inner().orders().update_status(id, to, note).await;

    if let Err(e) = live.reload(db.inner(), ChangeTable::Orders).await {
        warn!(order_id = %id, error = %e, "Orders snapshot reload failed");
    }

    Ok(result?)
}

pub async fn update_status(
    admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = transition(&db, &live, &id, request.status, request.note).await?;
    info!(order_number = %order.order_number, status = %order.status, admin = %admin.0.email, "Status set");
    Ok(Json(order))
}

/// Moves an order one step along pending → preparing → ready → completed.
pub async fn advance_order(
    _admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let current = db
        .inner()
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.clone()))?;

    let next = current.status.next().ok_or_else(|| {
        ApiError::new(
            ErrorCode::InvalidTransition,
            format!("Order {} is already {}", current.order_number, current.status),
        )
    })?;

    Ok(Json(transition(&db, &live, &id, next, None).await?))
}

pub async fn cancel_order(
    _admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(transition(&db, &live, &id, OrderStatus::Cancelled, None).await?))
}
