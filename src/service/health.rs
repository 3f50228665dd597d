//! `/health` handler.

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use opentelemetry::trace::TraceContextExt;

use super::{bare_response, AppState, HEALTH_PATH};

/// Always `200 OK` with body `OK`.
pub async fn handle_health(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let telemetry = &state.telemetry;
    let cx = telemetry.start_request_span("health_check", &telemetry.extract(&headers));
    let timer = telemetry.start_request(&method, HEALTH_PATH);

    let response = bare_response(StatusCode::OK, "OK");

    timer.finish(StatusCode::OK);
    cx.span().end();
    response
}
