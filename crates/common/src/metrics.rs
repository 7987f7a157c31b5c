//! Metrics collection for TexDit
//!
//! This module provides Prometheus metrics for observability.
//! Request metrics are labelled by endpoint; model metrics cover the inference backend.

use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;

/// Metrics registry for TexDit
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    pub registry: Arc<Registry>,
    pub requests: RequestMetrics,
    pub model: ModelMetrics,
}

/// HTTP request metrics
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    /// Total number of requests per endpoint
    pub requests_total: IntCounterVec,

    /// Total number of failed requests per endpoint
    pub requests_failed: IntCounterVec,

    /// Request duration per endpoint
    pub request_duration: HistogramVec,

    /// Requests currently being handled
    pub active_requests: IntGauge,
}

/// Inference backend metrics
#[derive(Debug, Clone)]
pub struct ModelMetrics {
    /// Duration of a single generate call
    pub generate_duration: Histogram,

    /// Duration of a model load (construct + probe)
    pub load_duration: Histogram,

    /// 1 while a model is loaded, 0 otherwise
    pub loaded: IntGauge,

    /// Successful model switches
    pub switches_total: IntCounter,
}

lazy_static! {
    /// Global metrics registry instance
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let requests_total = IntCounterVec::new(
            Opts::new("texdit_requests_total", "Total number of API requests"),
            &["endpoint"],
        )
        .unwrap();

        let requests_failed = IntCounterVec::new(
            Opts::new(
                "texdit_requests_failed_total",
                "Total number of API requests answered with an error",
            ),
            &["endpoint"],
        )
        .unwrap();

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "texdit_request_duration_seconds",
                "API request duration in seconds",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["endpoint"],
        )
        .unwrap();

        let active_requests = IntGauge::new(
            "texdit_active_requests",
            "Current number of API requests being handled",
        )
        .unwrap();

        let generate_duration = Histogram::with_opts(
            HistogramOpts::new(
                "texdit_model_generate_duration_seconds",
                "Backend generate call duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )
        .unwrap();

        let load_duration = Histogram::with_opts(
            HistogramOpts::new(
                "texdit_model_load_duration_seconds",
                "Model load duration in seconds",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )
        .unwrap();

        let loaded = IntGauge::new("texdit_model_loaded", "Whether a model is loaded").unwrap();

        let switches_total = IntCounter::new(
            "texdit_model_switches_total",
            "Total number of successful model switches",
        )
        .unwrap();

        // Register all metrics
        registry.register(Box::new(requests_total.clone())).unwrap();
        registry.register(Box::new(requests_failed.clone())).unwrap();
        registry.register(Box::new(request_duration.clone())).unwrap();
        registry.register(Box::new(active_requests.clone())).unwrap();

        registry.register(Box::new(generate_duration.clone())).unwrap();
        registry.register(Box::new(load_duration.clone())).unwrap();
        registry.register(Box::new(loaded.clone())).unwrap();
        registry.register(Box::new(switches_total.clone())).unwrap();

        MetricsRegistry {
            registry,
            requests: RequestMetrics {
                requests_total,
                requests_failed,
                request_duration,
                active_requests,
            },
            model: ModelMetrics {
                generate_duration,
                load_duration,
                loaded,
                switches_total,
            },
        }
    }

    /// Gather all metrics as text
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper trait for measuring latency
pub trait LatencyTimer {
    /// Observe the duration of a closure
    fn observe<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R;
}

impl LatencyTimer for Histogram {
    fn observe<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = std::time::Instant::now();
        let result = f();
        let duration = start.elapsed().as_secs_f64();
        Histogram::observe(self, duration);
        result
    }
}

/// Holds an in-flight gauge up until dropped, including when the request
/// future is cancelled
pub struct InFlight<'a> {
    gauge: &'a IntGauge,
}

impl<'a> InFlight<'a> {
    pub fn enter(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn test_metrics_registry() {
        let metrics = MetricsRegistry::new();

        metrics
            .requests
            .requests_total
            .with_label_values(&["/api/summarise"])
            .inc();
        metrics.requests.active_requests.inc();
        metrics.model.loaded.set(1);

        let output = metrics.gather();
        assert!(output.contains("texdit_requests_total"));
        assert!(output.contains("endpoint=\"/api/summarise\""));
        assert!(output.contains("texdit_model_loaded 1"));
    }

    #[test]
    fn test_latency_timer() {
        let metrics = MetricsRegistry::new();
        let value = LatencyTimer::observe(&metrics.model.generate_duration, || 42);
        assert_eq!(value, 42);
        assert_eq!(metrics.model.generate_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_in_flight_guard() {
        let gauge = IntGauge::new("test_in_flight", "in flight").unwrap();
        {
            let _first = InFlight::enter(&gauge);
            let _second = InFlight::enter(&gauge);
            assert_eq!(gauge.get(), 2);
        }
        assert_eq!(gauge.get(), 0);

        // a dropped, never-finished future releases its slot
        let pending = async {
            let _guard = InFlight::enter(&gauge);
            std::future::pending::<()>().await;
        };
        let mut pending = Box::pin(pending);
        let mut cx = std::task::Context::from_waker(futures::task::noop_waker_ref());
        assert!(pending.poll_unpin(&mut cx).is_pending());
        assert_eq!(gauge.get(), 1);
        drop(pending);
        assert_eq!(gauge.get(), 0);
    }
}
