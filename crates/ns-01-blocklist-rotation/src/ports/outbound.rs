//! # Outbound Ports
//!
//! Traits for the three stores the engine keeps consistent, plus a clock.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::domain::{
    AclEntry, BackendError, BlockRecord, BlocklistScope, ReservedRange, ResourceId, RuleDirection,
    RuleNumber, Timestamp,
};

/// Ordered rule list (network ACL) - outbound port.
#[async_trait]
pub trait RuleListClient: Send + Sync {
    /// Every entry of the resource, both directions, any number.
    async fn list_rules(&self, resource_id: &ResourceId) -> Result<Vec<AclEntry>, BackendError>;

    /// Ingress slots inside `range` that are occupied on the live resource.
    async fn list_reserved_rules(
        &self,
        resource_id: &ResourceId,
        range: &ReservedRange,
    ) -> Result<BTreeSet<RuleNumber>, BackendError> {
        let entries = self.list_rules(resource_id).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.direction == RuleDirection::Ingress && range.contains(e.rule_number))
            .map(|e| e.rule_number)
            .collect())
    }

    /// Install an ingress deny rule for `host_ip/32` at `rule_number`.
    ///
    /// Fails with `SlotOccupied` if the slot is already taken.
    async fn create_rule(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError>;

    /// Remove the ingress rule at `rule_number`.
    async fn delete_rule(
        &self,
        resource_id: &ResourceId,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError>;

    /// Rule-list resource associated with a boundary (subnet) reference.
    async fn resolve_resource_id(
        &self,
        boundary_ref: &str,
    ) -> Result<Option<ResourceId>, BackendError>;
}

/// Durable state table - outbound port.
///
/// Keyed by (`resource_id`, `inserted_at`).
#[async_trait]
pub trait BlockStateStore: Send + Sync {
    /// Point read by primary key.
    async fn get(
        &self,
        resource_id: &ResourceId,
        inserted_at: Timestamp,
    ) -> Result<Option<BlockRecord>, BackendError>;

    /// Record for `host_ip` inside one partition.
    async fn find_by_host(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
    ) -> Result<Option<BlockRecord>, BackendError>;

    /// All records of a partition ordered by `inserted_at` ascending.
    async fn records_for(&self, resource_id: &ResourceId)
        -> Result<Vec<BlockRecord>, BackendError>;

    /// Records for `host_ip` across every partition.
    async fn records_for_host(&self, host_ip: Ipv4Addr) -> Result<Vec<BlockRecord>, BackendError>;

    /// Insert a record; an existing key is rejected.
    async fn put(&self, record: &BlockRecord) -> Result<(), BackendError>;

    /// Delete by primary key.
    async fn delete(&self, resource_id: &ResourceId, inserted_at: Timestamp)
        -> Result<(), BackendError>;
}

/// Unbounded set-based blocklist (WAF IP set) - outbound port.
#[async_trait]
pub trait SetBlocklistClient: Send + Sync {
    /// Enforcement layer served by this client.
    fn scope(&self) -> BlocklistScope;

    /// Add `host_ip/32`; already present is success.
    async fn add_host(&self, set_id: &str, host_ip: Ipv4Addr) -> Result<(), BackendError>;

    /// Remove `host_ip/32`; already absent is success.
    async fn remove_host(&self, set_id: &str, host_ip: Ipv4Addr) -> Result<(), BackendError>;
}

/// Wall clock, seconds resolution.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now_secs(&self) -> Timestamp;
}
