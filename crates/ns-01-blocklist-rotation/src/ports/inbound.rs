//! # Inbound Ports
//!
//! API trait defining what the Blocklist Rotation subsystem can do.

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::domain::{ReconcileReport, ReservedRange, ResourceId, RotationError};

/// Blocklist rotation API - inbound port.
#[async_trait]
pub trait BlocklistRotationApi: Send + Sync {
    /// Block `host_ip` on `resource_id`, rotating the oldest slot when full.
    async fn reconcile(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        region: &str,
    ) -> Result<ReconcileReport, RotationError>;

    /// Rule-list resource protecting a boundary, `None` if not associated.
    async fn resolve(&self, boundary_ref: &str) -> Result<Option<ResourceId>, RotationError>;

    /// Slots managed by the engine.
    fn reserved_range(&self) -> ReservedRange;
}
