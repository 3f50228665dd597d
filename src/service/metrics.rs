//! `/metrics` handler: fake CPU and memory readings as JSON.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::KeyValue;

use super::{AppState, METRICS_PATH};

/// Exclusive upper bound of the CPU reading, in percent.
pub const CPU_USAGE_MAX: f64 = 100.0;

/// Exclusive upper bound of the memory reading: 1 GiB in bytes.
pub const MEMORY_USAGE_MAX: f64 = 1024.0 * 1024.0 * 1024.0;

/// Always `200 OK` with a JSON body of random readings.
pub async fn handle_metrics(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let telemetry = &state.telemetry;
    let cx = telemetry.start_request_span("metrics", &telemetry.extract(&headers));
    let timer = telemetry.start_request(&method, METRICS_PATH);

    let cpu_usage = truncate_cents(state.rng.next_float() * CPU_USAGE_MAX);
    let memory_usage = truncate_cents(state.rng.next_float() * MEMORY_USAGE_MAX);

    cx.span().set_attributes([
        KeyValue::new("system.cpu.usage", cpu_usage),
        KeyValue::new("system.memory.usage", memory_usage),
    ]);

    let response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(render_readings(cpu_usage, memory_usage)),
    )
        .into_response();

    timer.finish(StatusCode::OK);
    cx.span().end();
    response
}

/// `{"cpu_usage": 12.34, "memory_usage": 5678.90}`
pub fn render_readings(cpu_usage: f64, memory_usage: f64) -> String {
    format!("{{\"cpu_usage\": {cpu_usage:.2}, \"memory_usage\": {memory_usage:.2}}}")
}

/// Drop everything past two decimals so rounding in `render_readings` can
/// never push a reading up to its exclusive bound.
fn truncate_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}
