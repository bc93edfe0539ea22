//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (outcome counts and durations)
//! - Engine instances (currently reserved profile/port pairs)
//! - Source staging failures

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docbridge_conversions_total", "Total conversion requests"),
        &["result"], // "success", "rejected", "staging_failed", "engine_failed", ...
    )
    .unwrap()
});

/// Conversion duration in seconds, from staging to relocation.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "docbridge_conversion_duration_seconds",
            "Duration of a conversion request",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Engine instances currently reserved.
pub static ENGINE_INSTANCES_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "docbridge_engine_instances_active",
        "Number of engine instances currently running",
    )
    .unwrap()
});

// =============================================================================
// Staging Metrics
// =============================================================================

/// Sources that could not be staged.
pub static STAGING_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "docbridge_staging_failures_total",
        "Sources that could not be fetched or were empty",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Engine
        Box::new(ENGINE_INSTANCES_ACTIVE.clone()),
        // Staging
        Box::new(STAGING_FAILURES.clone()),
    ]
}
