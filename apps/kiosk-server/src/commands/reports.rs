//! # Report Handlers
//!
//! Dashboard overview, the end-of-day email and the kiosk funnel metrics.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, IntegrationsState, LiveState};
use kiosk_core::reports::{DailySummary, DashboardView, FunnelMetrics};

pub async fn dashboard(
    _admin: AdminSession,
    State(live): State<LiveState>,
    State(config): State<ConfigState>,
) -> Json<DashboardView> {
    let now = Utc::now();
    let day = *config.business_day();
    let products = live.with_products(|products| products.to_vec()).await;
    let view = live
        .with_orders(|orders| DashboardView::build(orders, &products, &day, now))
        .await;
    Json(view)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    pub success: bool,
    pub total_orders: usize,
    /// Decimal string, e.g. "41.50".
    pub total_revenue: String,
}

/// Emails today's summary to the configured recipients.
///
/// Reads orders straight from the database so the email never depends on
/// snapshot freshness.
pub async fn send_daily_summary(
    admin: AdminSession,
    State(db): State<DbState>,
    State(config): State<ConfigState>,
    State(integrations): State<IntegrationsState>,
) -> Result<Json<DailySummaryResponse>, ApiError> {
    let mailer = integrations.mailer()?;

    let now = Utc::now();
    let day = config.business_day();
    let orders = db.inner().orders().list_created_since(day.start_of_today(now)).await?;
    let summary = DailySummary::from_orders(&orders, day.date(now));

    mailer.send_daily_summary(&summary, config.currency_symbol()).await?;

    info!(
        date = %summary.date,
        total_orders = summary.total_orders,
        revenue = %config.format_currency(summary.total_revenue()),
        admin = %admin.0.email,
        "Daily summary sent"
    );

    Ok(Json(DailySummaryResponse {
        success: true,
        total_orders: summary.total_orders,
        total_revenue: summary.total_revenue().to_decimal_string(),
    }))
}

pub async fn funnel_metrics(
    _admin: AdminSession,
    State(integrations): State<IntegrationsState>,
) -> Result<Json<FunnelMetrics>, ApiError> {
    let metrics = integrations.analytics()?.funnel_metrics().await?;
    Ok(Json(metrics))
}
