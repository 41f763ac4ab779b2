//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `az_failover_cycles_total` - Total number of control loop cycles
//! - `az_failover_scan_passes_total` - Total number of full passes over the zone list
//! - `az_failover_zone_probes_total` - Zone probes by observed state
//! - `az_failover_zone_probe_errors_total` - Zone probes that failed
//! - `az_failover_active_zone` - 1 for the zone currently targeted, 0 otherwise
//! - `az_failover_template_updates_total` - Node templates updated
//! - `az_failover_template_update_errors_total` - Node template updates that failed
//! - `az_failover_templates_unchanged_total` - Selected templates already in the desired state
//! - `az_failover_template_fetch_errors_total` - Failed node template listings
//! - `az_failover_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `az_failover_api_operations_total` - CAST AI API calls by operation
//! - `az_failover_api_operation_duration_seconds` - Duration of CAST AI API calls

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static CYCLES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_cycles_total",
        "Total number of control loop cycles",
    )
    .expect("Failed to create CYCLES_TOTAL metric - this should never happen")
});

static SCAN_PASSES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_scan_passes_total",
        "Total number of full passes over the zone list",
    )
    .expect("Failed to create SCAN_PASSES_TOTAL metric - this should never happen")
});

static ZONE_PROBES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "az_failover_zone_probes_total",
            "Total number of zone probes by zone and observed state",
        ),
        &["zone", "state"],
    )
    .expect("Failed to create ZONE_PROBES_TOTAL metric - this should never happen")
});

static ZONE_PROBE_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "az_failover_zone_probe_errors_total",
            "Total number of failed zone probes by zone",
        ),
        &["zone"],
    )
    .expect("Failed to create ZONE_PROBE_ERRORS_TOTAL metric - this should never happen")
});

static ACTIVE_ZONE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "az_failover_active_zone",
            "1 for the zone node templates are currently pinned to",
        ),
        &["zone"],
    )
    .expect("Failed to create ACTIVE_ZONE metric - this should never happen")
});

static TEMPLATE_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_template_updates_total",
        "Total number of node templates updated",
    )
    .expect("Failed to create TEMPLATE_UPDATES_TOTAL metric - this should never happen")
});

static TEMPLATE_UPDATE_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_template_update_errors_total",
        "Total number of failed node template updates",
    )
    .expect("Failed to create TEMPLATE_UPDATE_ERRORS_TOTAL metric - this should never happen")
});

static TEMPLATES_UNCHANGED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_templates_unchanged_total",
        "Total number of selected node templates already pinned to the active zone",
    )
    .expect("Failed to create TEMPLATES_UNCHANGED_TOTAL metric - this should never happen")
});

static TEMPLATE_FETCH_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "az_failover_template_fetch_errors_total",
        "Total number of failed node template listings",
    )
    .expect("Failed to create TEMPLATE_FETCH_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "az_failover_reconciliation_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static API_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "az_failover_api_operations_total",
            "Total number of CAST AI API operations by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create API_OPERATIONS_TOTAL metric - this should never happen")
});

static API_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "az_failover_api_operation_duration_seconds",
            "Duration of CAST AI API operations in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create API_OPERATION_DURATION metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only if a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CYCLES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCAN_PASSES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ZONE_PROBES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ZONE_PROBE_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ACTIVE_ZONE.clone()))?;
    REGISTRY.register(Box::new(TEMPLATE_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TEMPLATE_UPDATE_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TEMPLATES_UNCHANGED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TEMPLATE_FETCH_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(API_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(API_OPERATION_DURATION.clone()))?;

    Ok(())
}

pub fn increment_cycles() {
    CYCLES_TOTAL.inc();
}

pub fn increment_scan_passes() {
    SCAN_PASSES_TOTAL.inc();
}

pub fn record_zone_probe(zone: &str, state: &str) {
    ZONE_PROBES_TOTAL.with_label_values(&[zone, state]).inc();
}

pub fn increment_zone_probe_errors(zone: &str) {
    ZONE_PROBE_ERRORS_TOTAL.with_label_values(&[zone]).inc();
}

/// Point the active zone gauge at `zone`, or at nothing
pub fn set_active_zone(zone: Option<&str>) {
    ACTIVE_ZONE.reset();
    if let Some(zone) = zone {
        ACTIVE_ZONE.with_label_values(&[zone]).set(1);
    }
}

pub fn increment_template_updates() {
    TEMPLATE_UPDATES_TOTAL.inc();
}

pub fn increment_template_update_errors() {
    TEMPLATE_UPDATE_ERRORS_TOTAL.inc();
}

pub fn increment_templates_unchanged() {
    TEMPLATES_UNCHANGED_TOTAL.inc();
}

pub fn increment_template_fetch_errors() {
    TEMPLATE_FETCH_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn record_api_operation(operation: &str, outcome: &str, duration: f64) {
    API_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    API_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}
