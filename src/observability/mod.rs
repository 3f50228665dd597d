//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Structured console logging via `tracing`
//! - OTLP/HTTP export of request spans and metrics

pub mod config;
pub mod logging;
pub mod telemetry;

pub use config::TelemetryConfig;
pub use telemetry::{RequestTimer, Telemetry, TelemetryError};
