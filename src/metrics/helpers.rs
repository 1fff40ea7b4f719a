//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    CACHE_HITS_TOTAL, CACHE_INVALIDATIONS_TOTAL, CACHE_MISSES_TOTAL, LOCALE_FALLBACKS_TOTAL,
    RENDERS_TOTAL, RENDER_FAILURES_TOTAL, RESOLUTIONS_TOTAL, STORE_ERRORS_TOTAL,
    STORE_OPERATION_LATENCY,
};
use crate::notification::Channel;

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording cache metrics
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit(tier: &str) {
        CACHE_HITS_TOTAL.with_label_values(&[tier]).inc();
    }

    pub fn record_miss(tier: &str) {
        CACHE_MISSES_TOTAL.with_label_values(&[tier]).inc();
    }

    pub fn record_invalidated(tier: &str, count: usize) {
        if count > 0 {
            CACHE_INVALIDATIONS_TOTAL
                .with_label_values(&[tier])
                .inc_by(count as u64);
        }
    }
}

/// Helper struct for recording resolution metrics
pub struct ResolutionMetrics;

impl ResolutionMetrics {
    /// Record which tier (or cache) served a lookup, or why it failed
    pub fn record_outcome(outcome: &str) {
        RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_locale_fallback() {
        LOCALE_FALLBACKS_TOTAL.inc();
    }
}

/// Helper struct for recording template store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_latency(operation: &str, seconds: f64) {
        STORE_OPERATION_LATENCY
            .with_label_values(&[operation])
            .observe(seconds);
    }

    pub fn record_error(operation: &str) {
        STORE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
    }
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    pub fn record_rendered(channel: Channel) {
        RENDERS_TOTAL.with_label_values(&[channel.as_str()]).inc();
    }

    pub fn record_failure(reason: &str) {
        RENDER_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }
}
