//! # Kiosk Server Binary
//!
//! Loads configuration, opens the database, and serves the kiosk and
//! admin API until Ctrl+C or SIGTERM.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use kiosk_db::{Database, DbConfig};
use kiosk_server::{build_router, init_tracing, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting kiosk server...");

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        bind = %config.bind_address(),
        db_path = ?config.database.path,
        utc_offset_minutes = config.business.utc_offset_minutes,
        "Configuration loaded"
    );

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
    }

    let db = Database::new(DbConfig::new(&config.database.path))
        .await
        .context("Failed to open database")?;

    if db.admins().count().await? == 0 {
        warn!("No admin accounts exist; run the seed binary with --admin-email to create one");
    }
    if config.resend.api_key.is_none() {
        warn!("RESEND_API_KEY not set, daily summary emails are disabled");
    }
    if config.posthog.api_key.is_none() {
        warn!("POSTHOG_API_KEY not set, funnel metrics are disabled");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config).await?;
    let listener_task = state.spawn_background();

    let app = build_router(state);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(addr = %bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_task.abort();
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
