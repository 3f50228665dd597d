//! HTTP server setup and lifecycle.
//!
//! Configures the axum server with:
//! - The `/health`, `/work` and `/metrics` handlers
//! - Graceful shutdown support

use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::service::{create_router, AppState};

/// Error type for serving HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] io::Error),
}

/// Bind `addr` and serve until `shutdown_rx` fires.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve(listener, state, shutdown_rx).await
}

/// Serve on an already-bound listener until `shutdown_rx` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Starting HTTP server");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
