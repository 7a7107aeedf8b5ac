//! Serving Metrics - Prometheus counters and latency histogram
//!
//! Each `InferenceMetrics` owns its registry so services (and tests) never
//! share counters by accident. Series names match the dashboards and the
//! rollback query: `serving_app_*` labelled by `model_variant`.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use super::canary::Variant;
use crate::constants::LATENCY_BUCKETS;

pub const SHADOW_OK: &str = "ok";
pub const SHADOW_ERROR: &str = "error";
/// Submission refused because the shadow pool was saturated
pub const SHADOW_DROPPED: &str = "dropped";

pub struct InferenceMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_exceptions_total: IntCounterVec,
    request_latency_seconds: HistogramVec,
    shadow_predictions_total: IntCounterVec,
    feature_fallbacks_total: IntCounter,
}

impl InferenceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("serving_app_requests_total", "Total prediction requests"),
            &["model_variant"],
        )?;
        let request_exceptions_total = IntCounterVec::new(
            Opts::new("serving_app_request_exceptions_total", "Prediction exceptions"),
            &["model_variant"],
        )?;
        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new("serving_app_request_latency_seconds", "Request latency")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["model_variant"],
        )?;
        let shadow_predictions_total = IntCounterVec::new(
            Opts::new("serving_app_shadow_predictions_total", "Shadow predictions by outcome"),
            &["outcome"],
        )?;
        let feature_fallbacks_total = IntCounter::new(
            "serving_app_feature_fallbacks_total",
            "Feature lookups served from raw event fields",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_exceptions_total.clone()))?;
        registry.register(Box::new(request_latency_seconds.clone()))?;
        registry.register(Box::new(shadow_predictions_total.clone()))?;
        registry.register(Box::new(feature_fallbacks_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_exceptions_total,
            request_latency_seconds,
            shadow_predictions_total,
            feature_fallbacks_total,
        })
    }

    // ------------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------------

    pub fn record_request(&self, variant: Variant) {
        self.requests_total.with_label_values(&[variant.as_str()]).inc();
    }

    pub fn record_exception(&self, variant: Variant) {
        self.request_exceptions_total.with_label_values(&[variant.as_str()]).inc();
    }

    pub fn observe_latency(&self, variant: Variant, seconds: f64) {
        self.request_latency_seconds
            .with_label_values(&[variant.as_str()])
            .observe(seconds);
    }

    pub fn record_shadow(&self, outcome: &str) {
        self.shadow_predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_feature_fallback(&self) {
        self.feature_fallbacks_total.inc();
    }

    // ------------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------------

    pub fn requests(&self, variant: Variant) -> u64 {
        self.requests_total.with_label_values(&[variant.as_str()]).get()
    }

    pub fn exceptions(&self, variant: Variant) -> u64 {
        self.request_exceptions_total.with_label_values(&[variant.as_str()]).get()
    }

    /// Number of latency observations for a variant
    pub fn latency_samples(&self, variant: Variant) -> u64 {
        self.request_latency_seconds
            .with_label_values(&[variant.as_str()])
            .get_sample_count()
    }

    pub fn shadow_outcomes(&self, outcome: &str) -> u64 {
        self.shadow_predictions_total.with_label_values(&[outcome]).get()
    }

    pub fn feature_fallbacks(&self) -> u64 {
        self.feature_fallbacks_total.get()
    }

    /// Prometheus text exposition
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            log::error!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_labelled_by_variant() {
        let metrics = InferenceMetrics::new().unwrap();
        metrics.record_request(Variant::Canary);
        metrics.record_request(Variant::Canary);
        metrics.record_exception(Variant::Canary);

        assert_eq!(metrics.requests(Variant::Canary), 2);
        assert_eq!(metrics.requests(Variant::Baseline), 0);
        assert_eq!(metrics.exceptions(Variant::Canary), 1);
    }

    #[test]
    fn test_render_contains_series() {
        let metrics = InferenceMetrics::new().unwrap();
        metrics.record_request(Variant::Baseline);
        metrics.observe_latency(Variant::Baseline, 0.07);
        metrics.record_shadow(SHADOW_OK);

        let text = metrics.render();
        assert!(text.contains("serving_app_requests_total{model_variant=\"baseline\"} 1"));
        assert!(text.contains("serving_app_request_latency_seconds_bucket{model_variant=\"baseline\",le=\"0.1\"} 1"));
        assert!(text.contains("serving_app_request_latency_seconds_bucket{model_variant=\"baseline\",le=\"0.05\"} 0"));
        assert!(text.contains("serving_app_shadow_predictions_total{outcome=\"ok\"} 1"));
        assert_eq!(metrics.latency_samples(Variant::Baseline), 1);
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = InferenceMetrics::new().unwrap();
        let b = InferenceMetrics::new().unwrap();
        a.record_feature_fallback();
        assert_eq!(a.feature_fallbacks(), 1);
        assert_eq!(b.feature_fallbacks(), 0);
    }
}
