//! Configuration parsing for the sample app.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults matching the collector sidecar deployment

use clap::{ArgAction, Parser};
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::logging::LogFormat;
use crate::observability::TelemetryConfig;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};

/// sample-app: a demo HTTP service emitting OpenTelemetry traces and metrics.
#[derive(Parser, Debug, Clone)]
#[command(name = "sample-app")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// OTLP/HTTP collector base endpoint
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = "http://localhost:4318")]
    pub otel_endpoint: String,

    /// Allow exporting over plain http
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_INSECURE",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub otel_insecure: bool,

    /// Service name reported in the telemetry resource
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "sample-app")]
    pub service_name: String,

    /// Service version reported in the telemetry resource
    #[arg(long, env = "SERVICE_VERSION", default_value = "1.0.0")]
    pub service_version: String,

    /// Deployment environment reported in the telemetry resource
    #[arg(long, env = "DEPLOYMENT_ENVIRONMENT", default_value = "kubernetes")]
    pub deployment_environment: String,

    /// Kubernetes node name reported in the telemetry resource
    #[arg(long, env = "K8S_NODE_NAME")]
    pub node_name: Option<String>,

    /// Seconds between metric exports
    #[arg(long, env = "OTEL_METRIC_EXPORT_INTERVAL_SECS", default_value_t = 10)]
    pub metric_interval_secs: u64,

    /// Seed for reproducible demo traffic (thread RNG when unset)
    #[arg(long, env = "SAMPLE_APP_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Address the HTTP listener binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Telemetry export settings derived from this configuration.
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            endpoint: self.otel_endpoint.clone(),
            insecure: self.otel_insecure,
            service_name: self.service_name.clone(),
            service_version: self.service_version.clone(),
            deployment_environment: self.deployment_environment.clone(),
            node_name: self.node_name.clone(),
            metric_export_interval: Duration::from_secs(self.metric_interval_secs.max(1)),
        }
    }

    /// Random source for handler draws.
    pub fn random_source(&self) -> Arc<dyn RandomSource> {
        match self.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let telemetry = TelemetryConfig::default();
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            log_level: "info".into(),
            log_format: LogFormat::Pretty,
            otel_endpoint: telemetry.endpoint,
            otel_insecure: telemetry.insecure,
            service_name: telemetry.service_name,
            service_version: telemetry.service_version,
            deployment_environment: telemetry.deployment_environment,
            node_name: None,
            metric_interval_secs: telemetry.metric_export_interval.as_secs(),
            seed: None,
        }
    }
}
