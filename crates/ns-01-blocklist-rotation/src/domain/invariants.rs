//! # Domain Invariants
//!
//! Checks a snapshot must pass before any store is mutated.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use super::entities::StateSnapshot;
use super::errors::RotationError;
use super::value_objects::ReservedRange;

/// Invariant: record count never exceeds the reserved range capacity.
pub fn invariant_within_capacity(
    snapshot: &StateSnapshot,
    range: &ReservedRange,
) -> Result<(), RotationError> {
    if snapshot.record_count() > range.capacity() {
        return Err(RotationError::CapacityExceeded {
            resource_id: snapshot.resource_id().clone(),
            count: snapshot.record_count(),
            capacity: range.capacity(),
        });
    }
    Ok(())
}

/// Invariant: one record per slot, every slot inside the range.
pub fn invariant_slot_exclusive(
    snapshot: &StateSnapshot,
    range: &ReservedRange,
) -> Result<(), RotationError> {
    let mut seen = BTreeSet::new();
    for record in snapshot.records() {
        if !range.contains(record.rule_number) {
            return Err(RotationError::InvalidRecord {
                resource_id: snapshot.resource_id().clone(),
                reason: format!(
                    "rule {} for {} outside reserved range {}",
                    record.rule_number, record.host_ip, range
                ),
            });
        }
        if !seen.insert(record.rule_number) {
            return Err(RotationError::InvalidRecord {
                resource_id: snapshot.resource_id().clone(),
                reason: format!("rule {} recorded more than once", record.rule_number),
            });
        }
    }
    Ok(())
}

/// Invariant: recorded slots equal live reserved slots.
///
/// An empty partition requires an empty reserved range on the live list.
pub fn invariant_in_sync(snapshot: &StateSnapshot, host_ip: Ipv4Addr) -> Result<(), RotationError> {
    let live = snapshot.live_rules();

    if snapshot.is_empty() {
        if !live.is_empty() {
            return Err(RotationError::PreexistingRules {
                resource_id: snapshot.resource_id().clone(),
                host_ip,
                live: live.iter().copied().collect(),
            });
        }
        return Ok(());
    }

    let durable = snapshot.durable_rules();
    if &durable != live {
        return Err(RotationError::SyncMismatch {
            resource_id: snapshot.resource_id().clone(),
            host_ip,
            durable: durable.into_iter().collect(),
            live: live.iter().copied().collect(),
            record_count: snapshot.record_count(),
        });
    }
    Ok(())
}
