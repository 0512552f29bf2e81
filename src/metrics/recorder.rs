//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec, Encoder,
    HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use tracing::warn;

const PREFIX: &str = "salessync_client";

/// Trait for recording pipeline metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records a finished call with its outcome: success, http_error or network_error.
    fn record_request(&self, method: &str, outcome: &str);

    /// Records the wall time of a call, retries and refreshes included.
    fn record_request_duration(&self, method: &str, duration_secs: f64);

    /// Records one backoff retry. `reason` is the status code or transport error kind.
    fn record_retry(&self, method: &str, reason: &str);

    fn record_refresh(&self, result: &str);

    fn record_redirect(&self, reason: &str);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    requests_total: CounterVec,
    request_duration_seconds: HistogramVec,

    retries_total: CounterVec,
    refreshes_total: CounterVec,
    redirects_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance with its own registry.
    pub fn new() -> Self {
        Self::try_new().expect("Failed to register pipeline metrics")
    }

    pub fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let requests_total = register_counter_vec_with_registry!(
            Opts::new(
                format!("{}_requests_total", PREFIX),
                "Total number of API calls by final outcome"
            ),
            &["method", "outcome"],
            registry.clone()
        )?;

        let request_duration_seconds = register_histogram_vec_with_registry!(
            format!("{}_request_duration_seconds", PREFIX),
            "API call duration in seconds, including retries",
            &["method"],
            vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            registry.clone()
        )?;

        let retries_total = register_counter_vec_with_registry!(
            Opts::new(
                format!("{}_retries_total", PREFIX),
                "Total backoff retries by reason"
            ),
            &["method", "reason"],
            registry.clone()
        )?;

        let refreshes_total = register_counter_vec_with_registry!(
            Opts::new(
                format!("{}_refreshes_total", PREFIX),
                "Total token refresh attempts triggered by 401 responses"
            ),
            &["result"],
            registry.clone()
        )?;

        let redirects_total = register_counter_vec_with_registry!(
            Opts::new(
                format!("{}_redirects_total", PREFIX),
                "Total login redirects issued by the pipeline"
            ),
            &["reason"],
            registry.clone()
        )?;

        Ok(Metrics {
            registry,
            requests_total,
            request_duration_seconds,
            retries_total,
            refreshes_total,
            redirects_total,
        })
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self, method: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[method, outcome])
            .inc();
    }

    fn record_request_duration(&self, method: &str, duration_secs: f64) {
        self.request_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    fn record_retry(&self, method: &str, reason: &str) {
        self.retries_total
            .with_label_values(&[method, reason])
            .inc();
    }

    fn record_refresh(&self, result: &str) {
        self.refreshes_total.with_label_values(&[result]).inc();
    }

    fn record_redirect(&self, reason: &str) {
        self.redirects_total.with_label_values(&[reason]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render_with_labels() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "success");
        metrics.record_retry("GET", "503");
        metrics.record_retry("GET", "503");
        metrics.record_redirect("forbidden");

        let rendered = metrics.render();
        assert!(rendered
            .contains(r#"salessync_client_requests_total{method="GET",outcome="success"} 1"#));
        assert!(rendered.contains(r#"salessync_client_retries_total{method="GET",reason="503"} 2"#));
        assert!(rendered.contains(r#"salessync_client_redirects_total{reason="forbidden"} 1"#));
    }

    #[test]
    fn test_instances_do_not_share_a_registry() {
        let a = Metrics::new();
        let b = Metrics::new();
        a.record_refresh("success");
        assert!(a.render().contains("salessync_client_refreshes_total"));
        assert!(!b.render().contains("salessync_client_refreshes_total{"));
    }
}
