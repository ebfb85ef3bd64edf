//! # Health Check

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::DbState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// `200 {"status":"ok"}` when the database answers, `503` otherwise.
pub async fn health(State(db): State<DbState>) -> (StatusCode, Json<HealthResponse>) {
    let database = db.inner().health_check().await;
    if database {
        (StatusCode::OK, Json(HealthResponse { status: "ok", database }))
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                database,
            }),
        )
    }
}
