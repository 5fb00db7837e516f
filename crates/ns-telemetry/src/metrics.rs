//! Prometheus metrics for the responder.
//!
//! All metrics follow the naming convention: `ns_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ROTATION (Subsystem 1)
    // =========================================================================

    /// Reconciliations by outcome: no-op/inserted/rotated/sync-fault/backend-fault
    pub static ref RECONCILIATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("ns_reconciliations_total", "Reconciliations by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Refusals because durable and live rule slots disagreed
    pub static ref SYNC_FAULTS: IntCounter = IntCounter::new(
        "ns_sync_faults_total",
        "Reconciliations refused because rule state was out of sync"
    ).expect("metric creation failed");

    /// Oldest entries evicted to make room
    pub static ref EVICTIONS: IntCounter = IntCounter::new(
        "ns_evictions_total",
        "Rule slots reclaimed from the oldest blocked host"
    ).expect("metric creation failed");

    /// IP set updates that failed after retries
    pub static ref BLOCKLIST_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("ns_blocklist_failures_total", "Failed IP set updates"),
        &["scope"]  // scope: edge/regional
    ).expect("metric creation failed");

    // =========================================================================
    // HANDLER
    // =========================================================================

    /// Notifications that could not be delivered
    pub static ref NOTIFY_FAILURES: IntCounter = IntCounter::new(
        "ns_notify_failures_total",
        "Block notifications that failed to send"
    ).expect("metric creation failed");

    /// Findings dropped because no rule list could be resolved
    pub static ref FINDINGS_SKIPPED: IntCounter = IntCounter::new(
        "ns_findings_skipped_total",
        "Findings skipped because the boundary did not resolve"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RECONCILIATIONS.clone()),
        Box::new(SYNC_FAULTS.clone()),
        Box::new(EVICTIONS.clone()),
        Box::new(BLOCKLIST_FAILURES.clone()),
        Box::new(NOTIFY_FAILURES.clone()),
        Box::new(FINDINGS_SKIPPED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
