// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Epictetus controller.
//!
//! All metrics live in a dedicated registry exposed at `/metrics` on the
//! health server, prefixed `epictetus_`.

use crate::model::{PassOutcome, PassReport};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::LazyLock;

/// Namespace prefix for all controller metrics
const METRICS_NAMESPACE: &str = "epictetus";

/// Global Prometheus metrics registry.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total reconciliation passes by outcome (`clean`, `partial`, `failed`).
pub static SYNC_PASSES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_sync_passes_total"),
        "Total number of reconciliation passes by outcome",
    );
    let counter = IntCounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliation passes in seconds.
pub static SYNC_PASS_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_sync_pass_duration_seconds"),
        "Duration of reconciliation passes in seconds",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// DNS records created since startup.
pub static RECORDS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_dns_records_created_total"),
        "Total number of DNS records created",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// DNS records deleted since startup.
pub static RECORDS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_dns_records_deleted_total"),
        "Total number of DNS records deleted",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Failed provider operations by kind (`create`, `delete`).
pub static OPERATION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_operation_failures_total"),
        "Total number of failed provider operations by kind",
    );
    let counter = IntCounterVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Nodes currently observed in the cluster.
pub static CLUSTER_NODES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_cluster_nodes"),
        "Total number of observed cluster nodes",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Nodes currently eligible for DNS records.
pub static ELIGIBLE_NODES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_eligible_nodes"),
        "Number of nodes currently eligible for DNS records",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Active hostname specs after conflict resolution.
pub static ACTIVE_HOSTNAME_SPECS: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_active_hostname_specs"),
        "Number of active hostname specifications",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Zones currently visible to the DNS credential.
pub static KNOWN_ZONES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_known_zones"),
        "Number of DNS zones accessible to the credential",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Unix timestamp of the last clean pass.
pub static LAST_SUCCESSFUL_SYNC_TIMESTAMP: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_last_successful_sync_timestamp"),
        "Unix timestamp of the last clean reconciliation pass",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Record one finished pass.
pub fn observe_pass(report: &PassReport) {
    SYNC_PASSES_TOTAL
        .with_label_values(&[&report.outcome.to_string()])
        .inc();
    SYNC_PASS_DURATION_SECONDS.observe(report.duration.as_secs_f64());
    RECORDS_CREATED_TOTAL.inc_by(report.records_created as u64);
    RECORDS_DELETED_TOTAL.inc_by(report.records_deleted as u64);
    CLUSTER_NODES.set(report.total_nodes as i64);
    ELIGIBLE_NODES.set(report.eligible_nodes as i64);
    ACTIVE_HOSTNAME_SPECS.set(report.active_specs as i64);
    if report.outcome == PassOutcome::Clean {
        LAST_SUCCESSFUL_SYNC_TIMESTAMP.set(report.started_at.timestamp());
    }
}

/// Update the zone gauge from the resolver's cache.
pub fn set_known_zones(count: usize) {
    KNOWN_ZONES.set(count as i64);
}

/// Count one failed provider operation.
pub fn record_operation_failure(operation: &str) {
    OPERATION_FAILURES_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Gather all metrics in Prometheus text format.
///
/// # Errors
///
/// Returns an error if metric encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
