//! Simulated unit of work used by the `/work` handler.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use std::time::Duration;

use crate::random::RandomSource;

/// Upper bound (exclusive) on simulated work.
pub const MAX_WORK_DURATION: Duration = Duration::from_millis(500);

/// One in this many simulated runs is flagged as an error.
pub const WORK_ERROR_ONE_IN: u64 = 10;

/// Wait for a random duration under `MAX_WORK_DURATION` and annotate the
/// span active in `cx`.
///
/// Occasionally flags the span with `error=true` and logs it. That is
/// telemetry noise only; the caller always sees success.
pub async fn simulate_work(cx: &Context, rng: &dyn RandomSource) -> Duration {
    let duration = rng.next_duration(MAX_WORK_DURATION);
    tokio::time::sleep(duration).await;

    let span = cx.span();
    span.set_attributes([
        KeyValue::new("work.type", "processing"),
        KeyValue::new("work.duration_ms", duration.as_millis() as i64),
    ]);

    if rng.chance(WORK_ERROR_ONE_IN) {
        span.set_attribute(KeyValue::new("error", true));
        let span_context = span.span_context();
        tracing::warn!(
            trace_id = %span_context.trace_id(),
            span_id = %span_context.span_id(),
            duration_ms = duration.as_millis() as u64,
            "Simulated error occurred"
        );
    }

    duration
}
