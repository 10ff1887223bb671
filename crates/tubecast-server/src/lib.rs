//! tubecast-server: HTTP streaming API and background refresh tasks.
//!
//! This crate ties the other tubecast crates into a running server
//! application. It provides:
//!
//! - Axum-based HTTP API serving cached renditions with range support
//! - Background refresher that keeps every channel's rendition current
//! - Cache janitor that expires renditions past their shelf life
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod janitor;
pub mod middleware;
pub mod prep;
pub mod refresher;
pub mod router;
pub mod routes;
pub mod store;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use tubecast_core::config::Config;

use crate::context::AppContext;

/// Start the tubecast server.
///
/// This is the main entry point. It constructs the [`AppContext`], spawns the
/// channel refresher and the cache janitor, and serves HTTP until a shutdown
/// signal is received.
pub async fn start(config: Config) -> tubecast_core::Result<()> {
    // Validate configuration.
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| tubecast_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::build(config)?;
    tracing::info!("Cache directory: {}", ctx.store.cache_dir().display());

    // Report external tool availability up front.
    for info in ctx.tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}", info.name);
        }
    }

    // Cancellation token for graceful shutdown.
    let cancel = CancellationToken::new();

    // Spawn the channel refresher.
    let refresher_ctx = ctx.clone();
    let refresher_cancel = cancel.clone();
    let refresher_handle = tokio::spawn(async move {
        refresher::run(refresher_ctx, refresher_cancel).await;
    });

    // Spawn the cache janitor.
    let janitor_ctx = ctx.clone();
    let janitor_cancel = cancel.clone();
    let janitor_handle = tokio::spawn(async move {
        janitor::run(janitor_ctx, janitor_cancel).await;
    });

    // Build and start the HTTP server.
    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| tubecast_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .map_err(|e| tubecast_core::Error::Internal(format!("Server error: {e}")))?;

    // Signal all background tasks to stop.
    cancel.cancel();

    // Wait for background tasks to finish.
    let _ = tokio::join!(refresher_handle, janitor_handle);

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal(cancel: CancellationToken) {
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
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
