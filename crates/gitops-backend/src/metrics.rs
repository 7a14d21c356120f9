/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Metrics Module
//!
//! Prometheus metrics describing what each reconciler sweep did. All metrics
//! live in [`REGISTRY`] and are exposed by the `/metrics` endpoint.

use gitops_utils::logging::prelude::*;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Global Prometheus registry for all reconciler metrics
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Rows deleted by cascade plans
/// Labels: family
pub static ROWS_DELETED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gitops_reconciler_rows_deleted_total",
        "Total number of database rows deleted by the reconciler",
    );
    let counter =
        IntCounterVec::new(opts, &["family"]).expect("Failed to create rows deleted counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register rows deleted counter");
    counter
});

/// Rows whose reference was cleared instead of being deleted
/// Labels: family
pub static ROWS_DECOUPLED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gitops_reconciler_rows_decoupled_total",
        "Total number of database rows decoupled by the reconciler",
    );
    let counter =
        IntCounterVec::new(opts, &["family"]).expect("Failed to create rows decoupled counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register rows decoupled counter");
    counter
});

/// Cascade plans that were skipped
/// Labels: family, reason
pub static ROWS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gitops_reconciler_rows_skipped_total",
        "Total number of orphan candidates skipped, by reason",
    );
    let counter = IntCounterVec::new(opts, &["family", "reason"])
        .expect("Failed to create rows skipped counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register rows skipped counter");
    counter
});

/// Operations created to notify the cluster agent
/// Labels: resource_type
pub static OPERATIONS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gitops_reconciler_operations_created_total",
        "Total number of Operation rows created by the reconciler",
    );
    let counter = IntCounterVec::new(opts, &["resource_type"])
        .expect("Failed to create operations created counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register operations created counter");
    counter
});

/// Operation resources recreated for long-waiting operations
pub static OPERATION_CRS_RECREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "gitops_reconciler_operation_crs_recreated_total",
        "Total number of Operation custom resources recreated by self-healing",
    )
    .expect("Failed to create operation CRs recreated counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register operation CRs recreated counter");
    counter
});

/// Sweep duration histogram
/// Labels: family
pub static SWEEP_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "gitops_reconciler_sweep_duration_seconds",
        "Duration of one family sweep in seconds",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0]);
    let histogram = HistogramVec::new(opts, &["family"])
        .expect("Failed to create sweep duration histogram");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("Failed to register sweep duration histogram");
    histogram
});

/// Unix timestamp of the last completed cycle
pub static LAST_CYCLE_TIMESTAMP_SECONDS: Lazy<Gauge> = Lazy::new(|| {
    let gauge = Gauge::new(
        "gitops_reconciler_last_cycle_timestamp_seconds",
        "Unix timestamp of the last completed reconciler cycle",
    )
    .expect("Failed to create last cycle timestamp gauge");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("Failed to register last cycle timestamp gauge");
    gauge
});

pub fn record_deleted(family: &str, rows: usize) {
    if rows > 0 {
        ROWS_DELETED_TOTAL
            .with_label_values(&[family])
            .inc_by(rows as u64);
    }
}

pub fn record_decoupled(family: &str, rows: usize) {
    if rows > 0 {
        ROWS_DECOUPLED_TOTAL
            .with_label_values(&[family])
            .inc_by(rows as u64);
    }
}

pub fn record_skipped(family: &str, reason: &str) {
    ROWS_SKIPPED_TOTAL
        .with_label_values(&[family, reason])
        .inc();
}

pub fn record_operation_created(resource_type: &str) {
    OPERATIONS_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

pub fn record_cr_recreated() {
    OPERATION_CRS_RECREATED_TOTAL.inc();
}

pub fn record_cycle_completed() {
    LAST_CYCLE_TIMESTAMP_SECONDS.set(chrono::Utc::now().timestamp() as f64);
}

/// Forces registration of every metric so they appear before the first sweep.
pub fn init() {
    Lazy::force(&ROWS_DELETED_TOTAL);
    Lazy::force(&ROWS_DECOUPLED_TOTAL);
    Lazy::force(&ROWS_SKIPPED_TOTAL);
    Lazy::force(&OPERATIONS_CREATED_TOTAL);
    Lazy::force(&OPERATION_CRS_RECREATED_TOTAL);
    Lazy::force(&SWEEP_DURATION_SECONDS);
    Lazy::force(&LAST_CYCLE_TIMESTAMP_SECONDS);
}

/// Encodes all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
