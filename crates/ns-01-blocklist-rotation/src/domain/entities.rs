//! # Domain Entities
//!
//! State-table records, the per-run snapshot and reconciliation results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use super::errors::{BackendError, Operation};
use super::value_objects::{BlocklistScope, ResourceId, RuleNumber, Timestamp};

/// One occupied rule slot, as recorded in the state table.
///
/// Keyed by (`resource_id`, `inserted_at`). Never updated in place: rotation
/// deletes the old record and creates a new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Partition key.
    pub resource_id: ResourceId,
    /// Sort key, seconds resolution.
    pub inserted_at: Timestamp,
    /// Blocked host.
    pub host_ip: Ipv4Addr,
    /// Slot holding the deny rule.
    pub rule_number: RuleNumber,
    /// Region the finding came from.
    pub region: String,
}

impl BlockRecord {
    /// Whether two records share the same primary key.
    pub fn same_key(&self, other: &BlockRecord) -> bool {
        self.resource_id == other.resource_id && self.inserted_at == other.inserted_at
    }
}

/// State of one resource as read immediately before mutation.
///
/// Both reads are captured together so the decision logic works on a single
/// view; anything that changes after the read is caught by the next run's gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    resource_id: ResourceId,
    records: Vec<BlockRecord>,
    live_rules: BTreeSet<RuleNumber>,
}

impl StateSnapshot {
    /// Build a snapshot; records are ordered by `inserted_at` ascending.
    pub fn new(
        resource_id: ResourceId,
        mut records: Vec<BlockRecord>,
        live_rules: BTreeSet<RuleNumber>,
    ) -> Self {
        records.sort_by_key(|r| r.inserted_at);
        Self {
            resource_id,
            records,
            live_rules,
        }
    }

    /// Resource the snapshot belongs to.
    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    /// Records, oldest first.
    pub fn records(&self) -> &[BlockRecord] {
        &self.records
    }

    /// Rule numbers live in the reserved range.
    pub fn live_rules(&self) -> &BTreeSet<RuleNumber> {
        &self.live_rules
    }

    /// Rule numbers referenced by the records.
    pub fn durable_rules(&self) -> BTreeSet<RuleNumber> {
        self.records.iter().map(|r| r.rule_number).collect()
    }

    /// Number of records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// No records in the partition.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Eviction candidate.
    pub fn oldest(&self) -> Option<&BlockRecord> {
        self.records.first()
    }

    /// Timestamp of the most recent record.
    pub fn newest_inserted_at(&self) -> Option<Timestamp> {
        self.records.last().map(|r| r.inserted_at)
    }
}

/// What a reconciliation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Host was already blocked on this resource.
    NoOp {
        /// Slot already holding the host
        rule_number: RuleNumber,
    },
    /// Host placed in a free slot.
    Inserted {
        /// Slot used
        rule_number: RuleNumber,
    },
    /// Oldest slot evicted and reused for the host.
    Rotated {
        /// Slot reused
        rule_number: RuleNumber,
        /// Record that was evicted
        evicted: BlockRecord,
        /// Whether the evicted host was removed from the IP sets
        released: bool,
    },
}

impl ReconcileOutcome {
    /// Stable name for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOp { .. } => "no-op",
            Self::Inserted { .. } => "inserted",
            Self::Rotated { .. } => "rotated",
        }
    }

    /// Slot holding the host after the run.
    pub fn rule_number(&self) -> RuleNumber {
        match self {
            Self::NoOp { rule_number }
            | Self::Inserted { rule_number }
            | Self::Rotated { rule_number, .. } => *rule_number,
        }
    }

    /// Whether any store was written.
    pub fn mutated(&self) -> bool {
        !matches!(self, Self::NoOp { .. })
    }
}

/// IP-set call that failed after its retries; recorded, not fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlocklistFailure {
    /// Layer of the set.
    pub scope: BlocklistScope,
    /// Configured set id.
    pub set_id: String,
    /// Host the call was about.
    pub host_ip: Ipv4Addr,
    /// `AddHost` or `RemoveHost`.
    pub operation: Operation,
    /// Final error.
    pub error: BackendError,
}

/// Result of one reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Resource reconciled.
    pub resource_id: ResourceId,
    /// Host requested.
    pub host_ip: Ipv4Addr,
    /// Action taken.
    pub outcome: ReconcileOutcome,
    /// Sort key of the record created, if any.
    pub inserted_at: Option<Timestamp>,
    /// IP-set calls that did not succeed.
    pub blocklist_failures: Vec<BlocklistFailure>,
}

impl ReconcileReport {
    /// Rule list and state table are updated but some IP set is not.
    pub fn is_degraded(&self) -> bool {
        !self.blocklist_failures.is_empty()
    }
}
