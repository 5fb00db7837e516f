//! # Domain Errors
//!
//! Error types for Blocklist Rotation.
//!
//! Two layers: `BackendError` is what an outbound port reports for a single
//! call, `RotationError` is what a reconciliation reports to its caller.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

use super::value_objects::{ResourceId, RuleNumber};

/// Failure of a single outbound call (rule list, state store, IP set).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Backend could not be reached or returned a transient failure.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The rule slot is already taken on the live resource.
    #[error("Rule {rule_number} already occupied on {resource_id}")]
    SlotOccupied {
        /// Rule-list resource
        resource_id: ResourceId,
        /// Occupied slot
        rule_number: RuleNumber,
    },

    /// Target entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Call did not complete in time.
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// Backend refused the request (validation, permissions).
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Whether retrying the same call can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Outbound operation names, used in logs and `RotationError::Backend`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read rule entries of a resource.
    ListRules,
    /// Install a deny rule.
    CreateRule,
    /// Remove a rule slot.
    DeleteRule,
    /// Map a boundary reference to a rule-list resource.
    ResolveResource,
    /// Point lookup of a record by host.
    FindRecord,
    /// Range read of a partition.
    LoadRecords,
    /// Insert a record.
    PutRecord,
    /// Delete a record.
    DeleteRecord,
    /// Cross-partition scan by host.
    ScanHost,
    /// Add a host to an IP set.
    AddHost,
    /// Remove a host from an IP set.
    RemoveHost,
    /// Deliver an outcome notification.
    Publish,
}

impl Operation {
    /// Stable name for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRules => "list_rules",
            Self::CreateRule => "create_rule",
            Self::DeleteRule => "delete_rule",
            Self::ResolveResource => "resolve_resource",
            Self::FindRecord => "find_record",
            Self::LoadRecords => "load_records",
            Self::PutRecord => "put_record",
            Self::DeleteRecord => "delete_record",
            Self::ScanHost => "scan_host",
            Self::AddHost => "add_host",
            Self::RemoveHost => "remove_host",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation error types.
#[derive(Debug, Error)]
pub enum RotationError {
    /// State table and live rule list disagree on occupied slots.
    #[error(
        "Rule state mismatch on {resource_id} for {host_ip}: durable={durable:?} live={live:?} (records={record_count})"
    )]
    SyncMismatch {
        /// Rule-list resource
        resource_id: ResourceId,
        /// Host of the rejected request
        host_ip: Ipv4Addr,
        /// Rule numbers recorded in the state table (sorted)
        durable: Vec<RuleNumber>,
        /// Rule numbers live in the reserved range (sorted)
        live: Vec<RuleNumber>,
        /// Record count in the partition
        record_count: usize,
    },

    /// Reserved range is occupied by rules this system never recorded.
    #[error("Reserved range on {resource_id} holds unmanaged rules {live:?} (host {host_ip})")]
    PreexistingRules {
        /// Rule-list resource
        resource_id: ResourceId,
        /// Host of the rejected request
        host_ip: Ipv4Addr,
        /// Live reserved rule numbers (sorted)
        live: Vec<RuleNumber>,
    },

    /// More records than reserved slots.
    #[error("Capacity exceeded on {resource_id}: {count}/{capacity} records")]
    CapacityExceeded {
        /// Rule-list resource
        resource_id: ResourceId,
        /// Records found
        count: usize,
        /// Reserved slots
        capacity: usize,
    },

    /// A record breaks slot exclusivity or lies outside the range.
    #[error("Invalid state record on {resource_id}: {reason}")]
    InvalidRecord {
        /// Rule-list resource
        resource_id: ResourceId,
        /// What is wrong
        reason: String,
    },

    /// A rule-list or state-store call exhausted its retries.
    #[error("Backend call {operation} failed on {resource_id} (partial={partial}): {source}")]
    Backend {
        /// Failed operation
        operation: Operation,
        /// Rule-list resource
        resource_id: ResourceId,
        /// Whether earlier steps of this run already mutated a store
        partial: bool,
        /// Underlying failure
        #[source]
        source: BackendError,
    },

    /// Engine configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RotationError {
    /// Stores disagree; operator intervention required, nothing was mutated.
    pub fn is_sync_fault(&self) -> bool {
        matches!(
            self,
            Self::SyncMismatch { .. }
                | Self::PreexistingRules { .. }
                | Self::CapacityExceeded { .. }
                | Self::InvalidRecord { .. }
        )
    }

    /// Whether this run may have left the stores partially updated.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Backend { partial: true, .. })
    }
}
