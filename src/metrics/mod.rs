//! Prometheus metrics for the template engine.
//!
//! This module provides metrics for monitoring template resolution:
//! - Cache metrics (hits, misses, invalidations per tier)
//! - Resolution metrics (which tier served a lookup, locale fallbacks)
//! - Store metrics (operation latency and errors)
//! - Render metrics (notifications rendered per channel, failures by reason)

mod helpers;

pub use helpers::{encode_metrics, CacheMetrics, RenderMetrics, ResolutionMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "notification_template";

lazy_static! {
    // ============================================================================
    // Cache Metrics
    // ============================================================================

    /// Cache hits by tier
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_cache_hits_total", METRIC_PREFIX),
        "Total cache hits",
        &["tier"]
    ).unwrap();

    /// Cache misses by tier (including expired entries)
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_cache_misses_total", METRIC_PREFIX),
        "Total cache misses",
        &["tier"]
    ).unwrap();

    /// Entries removed by invalidation, by tier
    pub static ref CACHE_INVALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_cache_invalidations_total", METRIC_PREFIX),
        "Total cache entries invalidated",
        &["tier"]
    ).unwrap();

    // ============================================================================
    // Resolution Metrics
    // ============================================================================

    /// Resolutions by outcome (cache, tenant, application, organization, not_found, error)
    pub static ref RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_resolutions_total", METRIC_PREFIX),
        "Total template resolutions by outcome",
        &["outcome"]
    ).unwrap();

    /// Resolutions served from the default locale instead of the requested one
    pub static ref LOCALE_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_locale_fallbacks_total", METRIC_PREFIX),
        "Total resolutions that fell back to the default locale"
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Template store operation latency in seconds
    pub static ref STORE_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_store_operation_seconds", METRIC_PREFIX),
        "Template store operation latency in seconds",
        &["operation"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    /// Template store errors by operation
    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_errors_total", METRIC_PREFIX),
        "Total template store errors",
        &["operation"]
    ).unwrap();

    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Notifications rendered by channel
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total notifications rendered",
        &["channel"]
    ).unwrap();

    /// Render failures by reason
    pub static ref RENDER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_render_failures_total", METRIC_PREFIX),
        "Total notification render failures",
        &["reason"]
    ).unwrap();
}
