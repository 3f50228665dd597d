//! HTTP request handlers.
//!
//! Each handler opens a server span, records one counter increment and one
//! duration observation, and writes a literal response:
//! - `/health`: liveness check
//! - `/work`: simulated work with a nested span and a 5% failure rate
//! - `/metrics`: fake system readings as JSON

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::observability::Telemetry;
use crate::random::RandomSource;

pub mod health;
pub mod metrics;
pub mod simulate;
pub mod work;

pub use health::handle_health;
pub use metrics::handle_metrics;
pub use simulate::simulate_work;
pub use work::handle_work;

pub const HEALTH_PATH: &str = "/health";
pub const WORK_PATH: &str = "/work";
pub const METRICS_PATH: &str = "/metrics";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<Telemetry>,
    pub rng: Arc<dyn RandomSource>,
}

impl AppState {
    pub fn new(telemetry: Arc<Telemetry>, rng: Arc<dyn RandomSource>) -> Self {
        Self { telemetry, rng }
    }
}

/// Create the HTTP router. Only GET and POST are routed.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(handle_health).post(handle_health))
        .route(WORK_PATH, get(handle_work).post(handle_work))
        .route(METRICS_PATH, get(handle_metrics).post(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain body without a `Content-Type` header.
fn bare_response(status: StatusCode, body: &'static str) -> Response {
    (status, Body::from(body)).into_response()
}
