//! In-memory set-based blocklist (WAF IP set).

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use tracing::debug;

use super::fault::FaultInjector;
use crate::domain::{BackendError, BlocklistScope, Operation};
use crate::ports::outbound::SetBlocklistClient;

/// Serializable image: set id → hosts.
pub type IpSetSnapshot = BTreeMap<String, BTreeSet<Ipv4Addr>>;

/// In-memory IP sets for one enforcement layer.
#[derive(Debug)]
pub struct InMemoryIpSet {
    scope: BlocklistScope,
    sets: RwLock<IpSetSnapshot>,
    faults: FaultInjector,
}

impl InMemoryIpSet {
    /// Empty backend for `scope`.
    pub fn new(scope: BlocklistScope) -> Self {
        Self::from_snapshot(scope, IpSetSnapshot::new())
    }

    /// Restore from a snapshot.
    pub fn from_snapshot(scope: BlocklistScope, snapshot: IpSetSnapshot) -> Self {
        Self {
            scope,
            sets: RwLock::new(snapshot),
            faults: FaultInjector::new(),
        }
    }

    /// Export current state.
    pub fn snapshot(&self) -> IpSetSnapshot {
        self.sets.read().clone()
    }

    /// Whether `host_ip` is listed in `set_id`.
    pub fn contains(&self, set_id: &str, host_ip: Ipv4Addr) -> bool {
        self.sets
            .read()
            .get(set_id)
            .is_some_and(|hosts| hosts.contains(&host_ip))
    }

    /// Hosts listed in `set_id`.
    pub fn hosts(&self, set_id: &str) -> BTreeSet<Ipv4Addr> {
        self.sets.read().get(set_id).cloned().unwrap_or_default()
    }

    /// List a host directly, bypassing fault injection.
    pub fn insert_raw(&self, set_id: &str, host_ip: Ipv4Addr) {
        self.sets
            .write()
            .entry(set_id.to_string())
            .or_default()
            .insert(host_ip);
    }

    /// Failure plan for this backend.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }
}

#[async_trait]
impl SetBlocklistClient for InMemoryIpSet {
    fn scope(&self) -> BlocklistScope {
        self.scope
    }

    async fn add_host(&self, set_id: &str, host_ip: Ipv4Addr) -> Result<(), BackendError> {
        self.faults.check(Operation::AddHost)?;
        let inserted = self
            .sets
            .write()
            .entry(set_id.to_string())
            .or_default()
            .insert(host_ip);
        debug!(
            "[ns-01] {} set {}: add {}/32 (new={})",
            self.scope, set_id, host_ip, inserted
        );
        Ok(())
    }

    async fn remove_host(&self, set_id: &str, host_ip: Ipv4Addr) -> Result<(), BackendError> {
        self.faults.check(Operation::RemoveHost)?;
        let removed = self
            .sets
            .write()
            .get_mut(set_id)
            .is_some_and(|hosts| hosts.remove(&host_ip));
        debug!(
            "[ns-01] {} set {}: remove {}/32 (present={})",
            self.scope, set_id, host_ip, removed
        );
        Ok(())
    }
}
