//! # Release Decision
//!
//! Whether an evicted host may leave the unbounded IP sets.
//!
//! The IP sets are shared by every rule-list resource, so a host evicted from
//! one resource stays listed while any other record still blocks it.

use crate::domain::BlockRecord;

/// Host of `evicted` is still referenced by another record.
///
/// `host_records` is the result of a cross-partition scan for the evicted
/// host; the evicted record itself is ignored if it is still present.
pub fn is_still_active(evicted: &BlockRecord, host_records: &[BlockRecord]) -> bool {
    host_records
        .iter()
        .filter(|r| r.host_ip == evicted.host_ip && !r.same_key(evicted))
        .any(|r| r.resource_id != evicted.resource_id || r.inserted_at > evicted.inserted_at)
}
