//! OpenTelemetry tracer, instruments and exporters.
//!
//! Key metrics:
//! - http_requests_total: Counter of handled requests by method/endpoint/status
//! - http_request_duration_seconds: Histogram of handler latency by method/endpoint

use axum::http::{HeaderMap, Method, StatusCode};
use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context, InstrumentationScope, KeyValue};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use std::time::{Duration, Instant};

use super::config::TelemetryConfig;

/// Error type for telemetry initialization and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid OTLP endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("OTLP endpoint {endpoint:?} is plain http but insecure export is disabled")]
    InsecureEndpoint { endpoint: String },
    #[error("failed to create OTLP span exporter: {0}")]
    SpanExporter(#[source] opentelemetry_otlp::ExporterBuildError),
    #[error("failed to create OTLP metric exporter: {0}")]
    MetricExporter(#[source] opentelemetry_otlp::ExporterBuildError),
    #[error("failed to flush telemetry: {0}")]
    Flush(#[source] OTelSdkError),
    #[error("failed to shut down telemetry: {0}")]
    Shutdown(#[source] OTelSdkError),
}

/// Tracer, propagator and request instruments shared by all handlers.
///
/// Built once at startup and handed to handlers behind an `Arc`. The
/// providers are kept so pending spans and metrics can be flushed on
/// shutdown.
#[derive(Debug)]
pub struct Telemetry {
    tracer: SdkTracer,
    propagator: TraceContextPropagator,
    requests_total: Counter<u64>,
    request_duration: Histogram<f64>,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Build OTLP/HTTP exporters for `config` and wire them into batching
    /// providers.
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let traces_endpoint = config.traces_endpoint()?;
        let metrics_endpoint = config.metrics_endpoint()?;
        let resource = config.resource();

        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(traces_endpoint.clone())
            .build()
            .map_err(TelemetryError::SpanExporter)?;

        let metric_exporter = MetricExporter::builder()
            .with_http()
            .with_endpoint(metrics_endpoint.clone())
            .build()
            .map_err(TelemetryError::MetricExporter)?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .with_resource(resource.clone())
            .build();

        let reader = PeriodicReader::builder(metric_exporter)
            .with_interval(config.metric_export_interval)
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build();

        tracing::info!(
            traces = %traces_endpoint,
            metrics = %metrics_endpoint,
            interval_secs = config.metric_export_interval.as_secs(),
            "OTLP exporters configured"
        );

        Ok(Self::from_providers(config, tracer_provider, meter_provider))
    }

    /// Wrap already-built providers, e.g. ones backed by in-memory exporters.
    pub fn from_providers(
        config: &TelemetryConfig,
        tracer_provider: SdkTracerProvider,
        meter_provider: SdkMeterProvider,
    ) -> Self {
        let scope = InstrumentationScope::builder(config.service_name.clone())
            .with_version(config.service_version.clone())
            .build();

        let tracer = tracer_provider.tracer_with_scope(scope.clone());
        let meter = meter_provider.meter_with_scope(scope);

        Self {
            tracer,
            propagator: TraceContextPropagator::new(),
            requests_total: meter
                .u64_counter("http_requests_total")
                .with_description("Total number of HTTP requests")
                .build(),
            request_duration: meter
                .f64_histogram("http_request_duration_seconds")
                .with_description("HTTP request duration in seconds")
                .with_unit("s")
                .build(),
            tracer_provider,
            meter_provider,
        }
    }

    /// Remote parent carried by W3C `traceparent`/`tracestate` headers.
    ///
    /// Returns an empty context when the headers carry none.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator
            .extract_with_context(&Context::new(), &HeaderExtractor(headers))
    }

    /// Start the server span for an inbound request.
    pub fn start_request_span(&self, name: &'static str, parent: &Context) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(SpanKind::Server)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    /// Start an internal child span of `parent`.
    pub fn start_span(&self, name: &'static str, parent: &Context) -> Context {
        let span = self.tracer.start_with_context(name, parent);
        parent.with_span(span)
    }

    /// Begin timing a request. Record it with [`RequestTimer::finish`].
    pub fn start_request(&self, method: &Method, endpoint: &'static str) -> RequestTimer<'_> {
        RequestTimer {
            telemetry: self,
            method: method.as_str().to_owned(),
            endpoint,
            start: Instant::now(),
        }
    }

    /// Export everything recorded so far.
    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        self.tracer_provider
            .force_flush()
            .map_err(TelemetryError::Flush)?;
        self.meter_provider
            .force_flush()
            .map_err(TelemetryError::Flush)
    }

    /// Flush and stop both providers.
    ///
    /// Both providers are shut down even if the first one fails; the first
    /// error is returned.
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        let traces = self.tracer_provider.shutdown();
        let metrics = self.meter_provider.shutdown();
        traces.map_err(TelemetryError::Shutdown)?;
        metrics.map_err(TelemetryError::Shutdown)
    }
}

/// Measures one request and records exactly one counter increment and one
/// histogram observation when finished.
#[derive(Debug)]
#[must_use = "a request timer records nothing until finished"]
pub struct RequestTimer<'a> {
    telemetry: &'a Telemetry,
    method: String,
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer<'_> {
    /// Record the request outcome and return its duration.
    pub fn finish(self, status: StatusCode) -> Duration {
        let elapsed = self.start.elapsed();

        self.telemetry.requests_total.add(
            1,
            &[
                KeyValue::new("method", self.method.clone()),
                KeyValue::new("endpoint", self.endpoint),
                KeyValue::new("status", status.as_u16().to_string()),
            ],
        );
        self.telemetry.request_duration.record(
            elapsed.as_secs_f64(),
            &[
                KeyValue::new("method", self.method),
                KeyValue::new("endpoint", self.endpoint),
            ],
        );

        elapsed
    }
}
