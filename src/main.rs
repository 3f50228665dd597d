//! sample-app: a demo HTTP service instrumented with OpenTelemetry.
//!
//! # Usage
//!
//! ```bash
//! sample-app --port 8080 --otel-endpoint http://otel-collector:4318
//! ```
//!
//! Environment variables can also be used:
//! - `PORT`: Port to listen on
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector base endpoint (OTLP/HTTP)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context as _;
use sample_app::config::Config;
use sample_app::observability::logging::init_logging;
use sample_app::observability::Telemetry;
use sample_app::server::run_server;
use sample_app::service::AppState;
use std::sync::Arc;
use tokio::sync::watch;

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C only");
                let _ = ctrl_c.await;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_logging(&config.log_level, config.log_format).context("failed to initialize logging")?;

    let telemetry = Arc::new(
        Telemetry::init(&config.telemetry()).context("failed to initialize telemetry")?,
    );
    let addr = config.listen_addr().context("invalid listen address")?;
    let state = AppState::new(Arc::clone(&telemetry), config.random_source());

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        port = config.port,
        "Starting server"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let served = run_server(addr, state, shutdown_rx).await;

    // Flush whatever was recorded, even if serving failed.
    tracing::info!("Flushing telemetry");
    if let Err(e) = telemetry.shutdown() {
        tracing::warn!(error = %e, "Telemetry shutdown incomplete");
    }

    served.context("server failed")?;
    tracing::info!("sample-app shutdown complete");
    Ok(())
}
