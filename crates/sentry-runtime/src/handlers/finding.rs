//! Finding handler.
//!
//! ```text
//! raw event ─→ intake ─→ resolve boundary ─→ reconcile ─→ notify
//!                              │ none
//!                              └─→ Skipped (no mutation, no notice)
//! ```

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use ns_01_blocklist_rotation::{BlocklistRotationApi, ReconcileOutcome, ReconcileReport, RotationError};
use ns_02_finding_intake::{extract, parse_event, FindingContext, FindingEvent, IntakeError};
use ns_telemetry::{
    metric_inc, BLOCKLIST_FAILURES, EVICTIONS, FINDINGS_SKIPPED, NOTIFY_FAILURES, RECONCILIATIONS,
    SYNC_FAULTS,
};

use crate::adapters::{BlockNotice, Notifier};

/// Handler errors.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event could not be turned into a block request.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Rotation refused or failed.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// Result of handling one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The boundary did not resolve to a rule list.
    Skipped {
        /// Extracted finding
        context: FindingContext,
    },
    /// Reconciliation completed.
    Blocked {
        /// Extracted finding
        context: FindingContext,
        /// Engine report
        report: ReconcileReport,
        /// Whether the notice was delivered
        notified: bool,
    },
}

/// Runs findings through intake, rotation and notification.
pub struct FindingHandler {
    api: Arc<dyn BlocklistRotationApi>,
    notifier: Arc<dyn Notifier>,
    edge_ip_set_id: String,
    regional_ip_set_id: String,
}

impl FindingHandler {
    /// Create a handler.
    pub fn new(
        api: Arc<dyn BlocklistRotationApi>,
        notifier: Arc<dyn Notifier>,
        edge_ip_set_id: impl Into<String>,
        regional_ip_set_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            notifier,
            edge_ip_set_id: edge_ip_set_id.into(),
            regional_ip_set_id: regional_ip_set_id.into(),
        }
    }

    /// Handle a raw JSON event.
    pub async fn handle_raw(&self, raw: &str) -> Result<HandlerOutcome, HandlerError> {
        let context = parse_event(raw).inspect_err(|err| {
            error!(error = %err, "[ns-02] finding rejected");
        })?;
        self.handle(context).await
    }

    /// Handle a decoded event.
    pub async fn handle_event(&self, event: &FindingEvent) -> Result<HandlerOutcome, HandlerError> {
        let context = extract(event).inspect_err(|err| {
            error!(error = %err, "[ns-02] finding rejected");
        })?;
        self.handle(context).await
    }

    /// Handle an extracted finding.
    pub async fn handle(&self, context: FindingContext) -> Result<HandlerOutcome, HandlerError> {
        info!(
            event_id = ?context.event_id,
            finding_type = %context.finding_type,
            host_ip = %context.host_ip,
            boundary_ref = %context.boundary_ref,
            instance_id = %context.instance_id,
            "[ns-02] finding received"
        );

        let Some(resource_id) = self.api.resolve(&context.boundary_ref).await? else {
            metric_inc!(FINDINGS_SKIPPED);
            info!(
                boundary_ref = %context.boundary_ref,
                host_ip = %context.host_ip,
                instance_id = %context.instance_id,
                "[ns-02] no rule list for boundary, skipping"
            );
            return Ok(HandlerOutcome::Skipped { context });
        };

        let report = match self
            .api
            .reconcile(&resource_id, context.host_ip, &context.region)
            .await
        {
            Ok(report) => report,
            Err(err) => {
                record_failure(&err);
                return Err(err.into());
            }
        };
        record_report(&report);

        let notice = BlockNotice::new(
            &context,
            &report,
            &self.edge_ip_set_id,
            &self.regional_ip_set_id,
        );
        let notified = match self.notifier.notify(&notice).await {
            Ok(()) => true,
            Err(err) => {
                metric_inc!(NOTIFY_FAILURES);
                warn!(
                    host_ip = %context.host_ip,
                    error = %err,
                    "[ns-02] notification failed, block kept"
                );
                false
            }
        };

        info!(
            resource_id = %report.resource_id,
            host_ip = %report.host_ip,
            outcome = report.outcome.as_str(),
            notified,
            "[ns-02] finding handled"
        );
        Ok(HandlerOutcome::Blocked {
            context,
            report,
            notified,
        })
    }
}

fn record_report(report: &ReconcileReport) {
    metric_inc!(RECONCILIATIONS, &[report.outcome.as_str()]);
    if matches!(report.outcome, ReconcileOutcome::Rotated { .. }) {
        metric_inc!(EVICTIONS);
    }
    for failure in &report.blocklist_failures {
        metric_inc!(BLOCKLIST_FAILURES, &[failure.scope.as_str()]);
    }
}

fn record_failure(err: &RotationError) {
    if err.is_sync_fault() {
        metric_inc!(SYNC_FAULTS);
        metric_inc!(RECONCILIATIONS, &["sync-fault"]);
    } else {
        metric_inc!(RECONCILIATIONS, &["backend-fault"]);
    }
}
