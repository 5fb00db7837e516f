//! # Slot Planner
//!
//! Pure decision logic: given a snapshot, pick the slot for a new host.
//!
//! ```text
//! snapshot ──gate──┬── empty ────────────→ Initialize(first)
//!                  ├── count < capacity ─→ Fill(lowest free live slot)
//!                  └── count == capacity → Evict(oldest, reuse its slot)
//! ```

use std::net::Ipv4Addr;

use crate::domain::{
    invariant_in_sync, invariant_slot_exclusive, invariant_within_capacity, BlockRecord,
    ReservedRange, RotationError, RuleNumber, StateSnapshot, Timestamp,
};

/// Where a new host goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotPlan {
    /// Partition is empty; start at the first slot.
    Initialize {
        /// Slot to use
        rule_number: RuleNumber,
    },
    /// A slot is free.
    Fill {
        /// Slot to use
        rule_number: RuleNumber,
    },
    /// Every slot is taken; evict the oldest record.
    Evict {
        /// Record to evict
        victim: BlockRecord,
        /// Slot to reuse
        rule_number: RuleNumber,
    },
}

impl SlotPlan {
    /// Slot the new host will occupy.
    pub fn rule_number(&self) -> RuleNumber {
        match self {
            Self::Initialize { rule_number }
            | Self::Fill { rule_number }
            | Self::Evict { rule_number, .. } => *rule_number,
        }
    }
}

/// Run every invariant a snapshot must satisfy before mutation.
pub fn check_consistency(
    snapshot: &StateSnapshot,
    range: &ReservedRange,
    host_ip: Ipv4Addr,
) -> Result<(), RotationError> {
    invariant_within_capacity(snapshot, range)?;
    invariant_slot_exclusive(snapshot, range)?;
    invariant_in_sync(snapshot, host_ip)
}

/// Decide the slot for `host_ip`, or refuse if the stores disagree.
pub fn plan_slot(
    snapshot: &StateSnapshot,
    range: &ReservedRange,
    host_ip: Ipv4Addr,
) -> Result<SlotPlan, RotationError> {
    check_consistency(snapshot, range, host_ip)?;

    if snapshot.is_empty() {
        return Ok(SlotPlan::Initialize {
            rule_number: range.first(),
        });
    }

    if snapshot.record_count() < range.capacity() {
        // Gate guarantees live == durable with distinct slots, so a gap exists.
        return range
            .lowest_free(snapshot.live_rules())
            .map(|rule_number| SlotPlan::Fill { rule_number })
            .ok_or_else(|| RotationError::CapacityExceeded {
                resource_id: snapshot.resource_id().clone(),
                count: snapshot.live_rules().len(),
                capacity: range.capacity(),
            });
    }

    match snapshot.oldest() {
        Some(oldest) => Ok(SlotPlan::Evict {
            victim: oldest.clone(),
            rule_number: oldest.rule_number,
        }),
        None => Ok(SlotPlan::Initialize {
            rule_number: range.first(),
        }),
    }
}

/// Sort key for a new record: `now`, bumped past the newest record of the
/// partition so keys stay unique and strictly increasing.
pub fn next_inserted_at(now: Timestamp, newest: Option<Timestamp>) -> Timestamp {
    match newest {
        Some(newest) if now <= newest => newest.saturating_add(1),
        _ => now,
    }
}
