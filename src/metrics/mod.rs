//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, HistogramVec, Opts, Registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Inference metrics
    pub inference_requests: CounterVec,
    pub inference_request_duration: HistogramVec,
    pub inference_rate_limited: Counter,
    pub inference_stream_fragments: Counter,

    // Profile metrics
    pub feedback_recorded: CounterVec,
    pub profile_updates: CounterVec,

    // Repurpose metrics
    pub repurpose_generations: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let inference_requests = register_counter_vec_with_registry!(
            Opts::new("inference_requests_total", "Total upstream inference requests"),
            &["model", "status"],
            registry
        )?;

        let inference_request_duration = register_histogram_vec_with_registry!(
            "inference_request_duration_seconds",
            "Upstream inference duration in seconds",
            &["model"],
            registry
        )?;

        let inference_rate_limited = register_counter_with_registry!(
            Opts::new("inference_rate_limited_total", "Total upstream 429 responses"),
            registry
        )?;

        let inference_stream_fragments = register_counter_with_registry!(
            Opts::new("inference_stream_fragments_total", "Total streamed content fragments"),
            registry
        )?;

        let feedback_recorded = register_counter_vec_with_registry!(
            Opts::new("feedback_recorded_total", "Total feedback entries recorded"),
            &["platform"],
            registry
        )?;

        let profile_updates = register_counter_vec_with_registry!(
            Opts::new("profile_updates_total", "Total profile write operations"),
            &["operation"],
            registry
        )?;

        let repurpose_generations = register_counter_vec_with_registry!(
            Opts::new("repurpose_generations_total", "Total per-platform generations"),
            &["platform", "status"],
            registry
        )?;

        Ok(Self {
            registry,
            inference_requests,
            inference_request_duration,
            inference_rate_limited,
            inference_stream_fragments,
            feedback_recorded,
            profile_updates,
            repurpose_generations,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed (or failed) upstream call
    pub fn record_inference(&self, model: &str, status: &str, elapsed: Duration) {
        self.inference_requests
            .with_label_values(&[model, status])
            .inc();
        self.inference_request_duration
            .with_label_values(&[model])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_rate_limited(&self) {
        self.inference_rate_limited.inc();
    }

    pub fn record_stream_fragment(&self) {
        self.inference_stream_fragments.inc();
    }

    /// Record a feedback entry; `platform` is "none" when the caller gave none
    pub fn record_feedback(&self, platform: &str) {
        self.feedback_recorded.with_label_values(&[platform]).inc();
    }

    pub fn record_profile_update(&self, operation: &str) {
        self.profile_updates.with_label_values(&[operation]).inc();
    }

    pub fn record_repurpose(&self, platform: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.repurpose_generations
            .with_label_values(&[platform, status])
            .inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
