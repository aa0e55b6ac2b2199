//! Prometheus metrics.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `scoring_requests_total` | Counter | `method`, `status` | Method calls served |
//! | `scoring_request_duration_seconds` | Histogram | `method` | Method call latency |
//! | `scoring_store_retries_total` | Counter | `operation` | Store attempts retried |
//!
//! Recording functions are no-ops until [`init_metrics`] installs a
//! recorder. The exporter serves the text format on its own listener.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Label used for calls that never reached a method.
pub const UNKNOWN_METHOD_LABEL: &str = "unknown";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    pub enabled: bool,

    /// Listen address of the exporter, e.g. `0.0.0.0:9090`.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    // Spawns the listener on the current tokio runtime.
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    tracing::info!(addr = %addr, "metrics exporter listening");

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        "scoring_requests_total",
        "Total number of method calls served"
    );
    describe_histogram!(
        "scoring_request_duration_seconds",
        "Method call duration in seconds"
    );
    describe_counter!(
        "scoring_store_retries_total",
        "Store attempts that failed transiently and were retried"
    );
}

/// Records a served method call.
///
/// `method` is `None` when the call failed before the envelope named one.
pub fn record_request(method: Option<&str>, status_code: u16, duration: Duration) {
    let method = method.unwrap_or(UNKNOWN_METHOD_LABEL).to_string();

    counter!(
        "scoring_requests_total",
        "method" => method.clone(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "scoring_request_duration_seconds",
        "method" => method
    )
    .record(duration.as_secs_f64());
}

/// Records one retried store attempt.
pub fn record_store_retry(operation: &'static str) {
    counter!("scoring_store_retries_total", "operation" => operation).increment(1);
}
