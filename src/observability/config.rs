//! Telemetry export configuration.
//!
//! The telemetry layer never reads the environment itself; everything it
//! needs arrives through [`TelemetryConfig`].

use axum::http::Uri;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    DEPLOYMENT_ENVIRONMENT_NAME, K8S_NODE_NAME, SERVICE_NAME, SERVICE_VERSION,
};
use std::time::Duration;

use super::TelemetryError;

/// OTLP path for trace export, relative to the collector base endpoint.
const TRACES_PATH: &str = "v1/traces";

/// OTLP path for metric export, relative to the collector base endpoint.
const METRICS_PATH: &str = "v1/metrics";

/// Where and as whom telemetry is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Collector base URL, e.g. `http://otel-collector:4318`.
    pub endpoint: String,
    /// Allow plain `http` endpoints.
    pub insecure: bool,
    pub service_name: String,
    pub service_version: String,
    pub deployment_environment: String,
    /// Kubernetes node the process runs on, if known.
    pub node_name: Option<String>,
    /// How often the periodic reader pushes metrics.
    pub metric_export_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4318".into(),
            insecure: true,
            service_name: "sample-app".into(),
            service_version: "1.0.0".into(),
            deployment_environment: "kubernetes".into(),
            node_name: None,
            metric_export_interval: Duration::from_secs(10),
        }
    }
}

impl TelemetryConfig {
    /// Check the endpoint is an absolute URL whose scheme the `insecure`
    /// flag permits.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        let uri: Uri = self
            .endpoint
            .parse()
            .map_err(|e| self.invalid_endpoint(format!("{e}")))?;

        if uri.authority().is_none() {
            return Err(self.invalid_endpoint("missing host"));
        }

        match uri.scheme_str() {
            Some("https") => Ok(()),
            Some("http") if self.insecure => Ok(()),
            Some("http") => Err(TelemetryError::InsecureEndpoint {
                endpoint: self.endpoint.clone(),
            }),
            _ => Err(self.invalid_endpoint("expected an http or https URL")),
        }
    }

    /// Full URL the span exporter posts to.
    pub fn traces_endpoint(&self) -> Result<String, TelemetryError> {
        self.signal_endpoint(TRACES_PATH)
    }

    /// Full URL the metric exporter posts to.
    pub fn metrics_endpoint(&self) -> Result<String, TelemetryError> {
        self.signal_endpoint(METRICS_PATH)
    }

    fn signal_endpoint(&self, path: &str) -> Result<String, TelemetryError> {
        self.validate()?;
        Ok(format!("{}/{path}", self.endpoint.trim_end_matches('/')))
    }

    /// Process-wide resource attached to every exported span and metric.
    pub fn resource(&self) -> Resource {
        let mut attributes = vec![
            KeyValue::new(SERVICE_NAME, self.service_name.clone()),
            KeyValue::new(SERVICE_VERSION, self.service_version.clone()),
            KeyValue::new(
                DEPLOYMENT_ENVIRONMENT_NAME,
                self.deployment_environment.clone(),
            ),
        ];
        if let Some(node) = &self.node_name {
            attributes.push(KeyValue::new(K8S_NODE_NAME, node.clone()));
        }

        Resource::builder_empty().with_attributes(attributes).build()
    }

    fn invalid_endpoint(&self, reason: impl Into<String>) -> TelemetryError {
        TelemetryError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}
