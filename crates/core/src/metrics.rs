//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Metadata fetches (outcome, duration)
//! - Search orchestration (superseded fetches)
//! - Trending store operations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Metadata Metrics
// =============================================================================

/// Metadata fetches by mode and outcome.
pub static METADATA_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinetrend_metadata_fetches_total",
            "Total metadata API fetches",
        ),
        &["mode", "outcome"], // mode: "discover", "search"; outcome: "success", "failure"
    )
    .unwrap()
});

/// Metadata fetch duration in seconds.
pub static METADATA_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinetrend_metadata_fetch_duration_seconds",
            "Duration of metadata API fetches",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Debounced queries dispatched to the metadata API.
pub static QUERIES_DISPATCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinetrend_queries_dispatched_total",
        "Debounced queries dispatched for fetching",
    )
    .unwrap()
});

/// Fetches dropped because a newer query was issued.
pub static FETCHES_SUPERSEDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinetrend_fetches_superseded_total",
        "Fetches cancelled or discarded because a newer query was issued",
    )
    .unwrap()
});

// =============================================================================
// Trending Metrics
// =============================================================================

/// Trending store operations by operation and status.
pub static TRENDING_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinetrend_trending_operations_total",
            "Total trending store operations",
        ),
        &["operation", "status"], // operation: "record_hit", "top_trending"; status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(METADATA_FETCHES.clone()),
        Box::new(METADATA_FETCH_DURATION.clone()),
        Box::new(QUERIES_DISPATCHED.clone()),
        Box::new(FETCHES_SUPERSEDED.clone()),
        Box::new(TRENDING_OPERATIONS.clone()),
    ]
}
