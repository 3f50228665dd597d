//! Test utilities and app harness for sample-app tests.
//!
//! Provides:
//! - In-memory span and metric exporters wired into `Telemetry`
//! - In-process request helpers driving the router
//! - A real TCP server for end-to-end tests

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use sample_app::observability::logging::init_test_logging;
use sample_app::observability::{Telemetry, TelemetryConfig};
use sample_app::random::RandomSource;
use sample_app::server::serve;
use sample_app::service::{create_router, AppState};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// One exported data point: its attributes and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub attributes: BTreeMap<String, String>,
    pub value: u64,
}

impl Point {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// App state backed by in-memory exporters.
pub struct TestApp {
    pub state: AppState,
    spans: InMemorySpanExporter,
    metrics: InMemoryMetricExporter,
}

impl TestApp {
    /// Build an app drawing from `rng`.
    pub fn new(rng: impl RandomSource + 'static) -> Self {
        init_test_logging();

        let spans = InMemorySpanExporter::default();
        let metrics = InMemoryMetricExporter::default();
        let tracer_provider = SdkTracerProvider::builder()
            .with_simple_exporter(spans.clone())
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metrics.clone()).build())
            .build();
        let telemetry = Telemetry::from_providers(
            &TelemetryConfig::default(),
            tracer_provider,
            meter_provider,
        );

        Self {
            state: AppState::new(Arc::new(telemetry), Arc::new(rng)),
            spans,
            metrics,
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, method: Method, path: &str) -> TestResponse {
        self.send_with_headers(method, path, HeaderMap::new()).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("failed to build request");
        request.headers_mut().extend(headers);

        let response = create_router(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).expect("body is not utf-8"),
        }
    }

    /// Spans ended so far.
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().expect("span exporter failed")
    }

    /// Spans named `name`.
    pub fn spans_named(&self, name: &str) -> Vec<SpanData> {
        self.spans()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    /// Data points of `http_requests_total`.
    pub fn request_counts(&self) -> Vec<Point> {
        let Some(last) = self.collect_metrics().pop() else {
            return Vec::new();
        };
        let mut points = Vec::new();
        for metric in last.scope_metrics().flat_map(|sm| sm.metrics()) {
            if metric.name() != "http_requests_total" {
                continue;
            }
            if let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() {
                points.extend(sum.data_points().map(|dp| Point {
                    attributes: attribute_map(dp.attributes()),
                    value: dp.value(),
                }));
            }
        }
        points
    }

    /// Observation counts of `http_request_duration_seconds`.
    pub fn duration_counts(&self) -> Vec<Point> {
        let Some(last) = self.collect_metrics().pop() else {
            return Vec::new();
        };
        let mut points = Vec::new();
        for metric in last.scope_metrics().flat_map(|sm| sm.metrics()) {
            if metric.name() != "http_request_duration_seconds" {
                continue;
            }
            if let AggregatedMetrics::F64(MetricData::Histogram(hist)) = metric.data() {
                points.extend(hist.data_points().map(|dp| Point {
                    attributes: attribute_map(dp.attributes()),
                    value: dp.count(),
                }));
            }
        }
        points
    }

    /// Total of all `http_requests_total` points.
    pub fn total_requests(&self) -> u64 {
        self.request_counts().iter().map(|p| p.value).sum()
    }

    fn collect_metrics(&self) -> Vec<ResourceMetrics> {
        self.state
            .telemetry
            .force_flush()
            .expect("failed to flush telemetry");
        self.metrics
            .get_finished_metrics()
            .expect("metric exporter failed")
    }
}

/// Value of attribute `key` on `span`.
pub fn span_attr(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

fn attribute_map<'a>(attrs: impl Iterator<Item = &'a KeyValue>) -> BTreeMap<String, String> {
    attrs
        .map(|kv| (kv.key.as_str().to_owned(), kv.value.as_str().into_owned()))
        .collect()
}

/// Wait for a condition to become true with timeout.
///
/// Returns `true` if the condition was met before `timeout` expired.
pub async fn wait_for<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}

/// App served over a real TCP socket on an ephemeral port.
pub struct TestServer {
    pub app: TestApp,
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(rng: impl RandomSource + 'static) -> Self {
        let app = TestApp::new(rng);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = app.state.clone();
        let handle = tokio::spawn(async move {
            serve(listener, state, shutdown_rx)
                .await
                .expect("test server failed");
        });

        Self {
            app,
            addr,
            shutdown_tx,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.await.expect("server task panicked");
    }
}
