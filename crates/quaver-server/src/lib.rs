//! quaver-server: HTTP API server.
//!
//! This crate ties the other quaver crates into a running server
//! application:
//!
//! - Axum-based HTTP API with token authentication
//! - Deduplicated, content-addressed upload storage
//! - Range-aware audio streaming for quiz playback
//! - Graceful shutdown via signal handling

pub mod access;
pub mod context;
pub mod error;
pub mod middleware;
pub mod range;
pub mod router;
pub mod routes;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use quaver_core::config::Config;

use crate::context::AppContext;
use crate::storage::UploadStore;

/// Start the quaver server.
///
/// This is the main entry point. It initializes the database, constructs
/// the [`AppContext`], and serves the HTTP API until a shutdown signal is
/// received.
pub async fn start(config: Config) -> quaver_core::Result<()> {
    // Validate configuration.
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = quaver_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    let store = Arc::new(UploadStore::new(config.storage.upload_dir.clone()));

    let ctx = AppContext {
        db,
        config: Arc::new(config.clone()),
        store,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| quaver_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(ctx, config.server.static_dir.clone());

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| quaver_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| quaver_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
