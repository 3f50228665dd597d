//! `/work` handler.
//!
//! Runs the work simulator under a `nested_operation` child span, then fails
//! one request in twenty with a 500. The failure draw is independent of the
//! simulator's own anomaly flag.

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::KeyValue;

use super::{bare_response, simulate_work, AppState, WORK_PATH};

/// One in this many requests fails with a 500.
pub const FAILURE_ONE_IN: u64 = 20;

/// Body of a `200 OK` response.
pub const SUCCESS_BODY: &str = "Work completed successfully";
/// Body of a `500 Internal Server Error` response.
pub const FAILURE_BODY: &str = "Internal Server Error";

/// Runs the work on its own task, so a client disconnect cannot drop it
/// before the request is recorded.
pub async fn handle_work(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    match tokio::spawn(run_work(state, method, headers)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Work task failed");
            bare_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
        }
    }
}

async fn run_work(state: AppState, method: Method, headers: HeaderMap) -> Response {
    let telemetry = &state.telemetry;
    let rng = state.rng.as_ref();

    let cx = telemetry.start_request_span("do_work", &telemetry.extract(&headers));
    let timer = telemetry.start_request(&method, WORK_PATH);

    cx.span().set_attributes([
        KeyValue::new("user.id", format!("user-{}", rng.next_below(100))),
        KeyValue::new("request.id", format!("req-{}", rng.next_below(10_000))),
    ]);

    let child = telemetry.start_span("nested_operation", &cx);
    simulate_work(&child, rng).await;
    child.span().end();

    let (status, body) = if rng.chance(FAILURE_ONE_IN) {
        let span = cx.span();
        span.set_attribute(KeyValue::new("error", true));
        span.set_status(Status::error("simulated failure"));
        (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
    } else {
        (StatusCode::OK, SUCCESS_BODY)
    };

    let response = bare_response(status, body);

    let elapsed = timer.finish(status);
    tracing::debug!(
        status = status.as_u16(),
        latency_ms = elapsed.as_secs_f64() * 1000.0,
        "Work request handled"
    );
    cx.span().end();
    response
}
