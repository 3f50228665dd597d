//! sample-app: a demo HTTP service instrumented with OpenTelemetry.
//!
//! Three handlers generate demo traffic for a collector sidecar: spans with
//! parent/child relationships, a request counter and a latency histogram,
//! all exported over OTLP/HTTP.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`observability`]: Logging, tracer, instruments and exporters
//! - [`random`]: Injectable randomness for simulated latency and failures
//! - [`server`]: HTTP server setup
//! - [`service`]: Request handlers (`/health`, `/work`, `/metrics`)

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // observability::telemetry::TelemetryError is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc,      // Panic docs can be verbose
    clippy::cast_possible_truncation // Simulated durations are far below i64::MAX ms
)]

pub mod config;
pub mod observability;
pub mod random;
pub mod server;
pub mod service;
