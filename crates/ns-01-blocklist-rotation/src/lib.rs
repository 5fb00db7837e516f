//! # NS-01 Blocklist Rotation
//!
//! FIFO-rotating host block list kept consistent across a network rule list,
//! a durable state table and two WAF IP sets.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Each flagged host gets a deny rule in a small reserved range of rule
//! numbers (71-80 by default). When the range is full, the oldest entry is
//! evicted and its slot reused.
//!
//! ## Safety Properties
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Idempotent | A host already recorded for the resource is a no-op |
//! | Bounded | Never more records than reserved slots |
//! | Consistent | Durable slots must equal live slots before any write |
//! | Ordered | Rule deleted before record, rule created before record |
//! | Shared hosts | IP sets keep a host still blocked on another resource |
//!
//! ## Module Structure
//!
//! ```text
//! ns-01-blocklist-rotation/
//! ├── domain/          # records, snapshots, errors, invariants, config
//! ├── algorithms/      # slot planning, still-active check
//! ├── ports/           # BlocklistRotationApi, backend traits
//! ├── adapters/        # in-memory backends with fault injection
//! └── service/         # RotationService, retry
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    FaultInjector, InMemoryIpSet, InMemoryRuleList, InMemoryStateStore, IpSetSnapshot,
    ManualClock, RuleListSnapshot, SystemClock,
};
pub use algorithms::{check_consistency, is_still_active, next_inserted_at, plan_slot, SlotPlan};
pub use domain::{
    host_cidr, invariant_in_sync, invariant_slot_exclusive, invariant_within_capacity, AclEntry,
    BackendError, BlockRecord, BlocklistFailure, BlocklistScope, Operation, PortRange, Protocol,
    ReconcileOutcome, ReconcileReport, ReservedRange, ResourceId, RetryPolicy, RotationConfig,
    RotationError, RuleAction, RuleDirection, RuleNumber, StateSnapshot, Timestamp,
};
pub use ports::{BlockStateStore, BlocklistRotationApi, Clock, RuleListClient, SetBlocklistClient};
pub use service::{with_retry, BlocklistTarget, RotationService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
