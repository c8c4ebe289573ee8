//! # Shopbook API
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Server                                    │
//! │                                                                         │
//! │  Dashboard ───► HTTP (8080) ───► Services ───► SQLite                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use shopbook_api::bootstrap::ensure_superadmin;
use shopbook_api::{build_router, AppConfig, AppState};
use shopbook_db::Database;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Shopbook API server...");

    // Load configuration
    let config = AppConfig::load().context("loading configuration")?;
    let addr = config.socket_addr()?;
    info!(
        %addr,
        database = %config.database_path,
        "Configuration loaded"
    );

    // Open database (migrations run on connect)
    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;
    info!("Database ready");

    ensure_superadmin(&db, &config.bootstrap)
        .await
        .context("creating bootstrap super-admin")?;

    let state = Arc::new(AppState::new(db, config));
    let app = build_router(state.clone());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
