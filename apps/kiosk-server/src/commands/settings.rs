//! # Settings Handlers

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::{DbState, LiveState};
use kiosk_core::{AppSettings, SettingsPatch};
use kiosk_db::ChangeTable;

/// Applies a partial settings update. Negative prices are stored as zero.
pub async fn update_settings(
    admin: AdminSession,
    State(db): State<DbState>,
    State(live): State<LiveState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<AppSettings>, ApiError> {
    let settings = db.inner().settings().update(&patch).await?;
    live.reload(db.inner(), ChangeTable::Settings).await?;
    info!(admin = %admin.0.email, "Settings changed");
    Ok(Json(settings))
}
