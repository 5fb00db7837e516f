//! Outcome notifications.
//!
//! Delivery is best-effort: callers log and count failures but never let
//! them change a reconciliation result.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use ns_01_blocklist_rotation::{
    with_retry, BackendError, Operation, ReconcileOutcome, ReconcileReport, RetryPolicy,
};
use ns_02_finding_intake::FindingContext;

/// Subject line of every notice.
pub const NOTICE_SUBJECT: &str = "NACL-Sentry Alert";

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Client could not be constructed.
    #[error("Notifier setup failed: {0}")]
    Setup(String),

    /// Delivery failed after retries.
    #[error("Notification to {target} failed: {source}")]
    Delivery {
        /// Topic or URL
        target: String,
        /// Last failure
        #[source]
        source: BackendError,
    },
}

/// Human-readable account of one handled finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNotice {
    /// Fixed subject line.
    pub subject: String,
    /// Rendered body.
    pub message: String,
    /// Blocked host.
    pub host_ip: String,
    /// Finding type that triggered the block.
    pub finding_type: String,
    /// Rule-list resource.
    pub resource_id: String,
    /// Affected instance.
    pub instance_id: String,
    /// Region of the finding.
    pub region: String,
    /// `no-op`, `inserted` or `rotated`.
    pub outcome: String,
    /// Slot holding the host.
    pub rule_number: u16,
}

impl BlockNotice {
    /// Render a notice for a completed reconciliation.
    pub fn new(
        context: &FindingContext,
        report: &ReconcileReport,
        edge_ip_set_id: &str,
        regional_ip_set_id: &str,
    ) -> Self {
        let mut message = format!(
            "NACL-Sentry Event Info:\r\n\
             Suspicious activity detected from host {host} due to {finding}.  \
             The following resources were targeted for update as needed; \
             Edge IP Set: {edge}, Regional IP Set: {regional}, Rule List: {resource}, \
             Instance: {instance}, Region: {region}. Outcome: {outcome} (rule {rule}).",
            host = context.host_ip,
            finding = context.finding_type,
            edge = edge_ip_set_id,
            regional = regional_ip_set_id,
            resource = report.resource_id,
            instance = context.instance_id,
            region = context.region,
            outcome = report.outcome.as_str(),
            rule = report.outcome.rule_number(),
        );
        if let ReconcileOutcome::Rotated { evicted, .. } = &report.outcome {
            message.push_str(&format!(" Evicted host: {}.", evicted.host_ip));
        }
        if report.is_degraded() {
            message.push_str(&format!(
                " IP set updates failed: {}.",
                report.blocklist_failures.len()
            ));
        }

        Self {
            subject: NOTICE_SUBJECT.to_string(),
            message,
            host_ip: context.host_ip.to_string(),
            finding_type: context.finding_type.clone(),
            resource_id: report.resource_id.to_string(),
            instance_id: context.instance_id.clone(),
            region: context.region.clone(),
            outcome: report.outcome.as_str().to_string(),
            rule_number: report.outcome.rule_number(),
        }
    }
}

/// Notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice.
    async fn notify(&self, notice: &BlockNotice) -> Result<(), NotifyError>;
}

/// Writes notices to the log under a topic name.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    topic: String,
}

impl LogNotifier {
    /// Notifier for `topic`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &BlockNotice) -> Result<(), NotifyError> {
        info!(
            topic = %self.topic,
            subject = %notice.subject,
            host_ip = %notice.host_ip,
            outcome = %notice.outcome,
            message = %notice.message,
            "Notification sent"
        );
        Ok(())
    }
}

/// Whole-request timeout of the webhook client.
pub const WEBHOOK_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const WEBHOOK_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Posts notices as JSON to an HTTP endpoint.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`.
    pub fn new(url: impl Into<String>, retry: RetryPolicy) -> Result<Self, NotifyError> {
        Self::with_timeout(url, retry, WEBHOOK_REQUEST_TIMEOUT)
    }

    /// Create a notifier whose requests give up after `request_timeout`.
    pub fn with_timeout(
        url: impl Into<String>,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(WEBHOOK_CONNECT_TIMEOUT.min(request_timeout))
            .build()
            .map_err(|e| NotifyError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            retry,
            request_timeout,
        })
    }

    async fn post(&self, notice: &BlockNotice) -> Result<(), BackendError> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.request_timeout)
                } else {
                    BackendError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() || status.as_u16() == 429 {
            Err(BackendError::Unavailable(format!("HTTP {status}")))
        } else {
            Err(BackendError::Rejected(format!("HTTP {status}")))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &BlockNotice) -> Result<(), NotifyError> {
        with_retry(&self.retry, Operation::Publish, move || self.post(notice))
            .await
            .map_err(|source| NotifyError::Delivery {
                target: self.url.clone(),
                source,
            })?;
        debug!(url = %self.url, host_ip = %notice.host_ip, "Notification posted");
        Ok(())
    }
}
