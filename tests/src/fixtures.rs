//! Shared fixtures: a fully wired engine over in-memory backends, plus a
//! rule-list wrapper that records the order of mutating calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use ns_01_blocklist_rotation::{
    AclEntry, BackendError, BlockRecord, BlocklistScope, BlocklistTarget, InMemoryIpSet,
    InMemoryRuleList, InMemoryStateStore, ManualClock, ResourceId, RetryPolicy, RotationConfig,
    RotationService, RuleListClient, RuleNumber, Timestamp,
};

/// Edge set id used by every fixture.
pub const EDGE_SET: &str = "edge-blocklist";
/// Regional set id used by every fixture.
pub const REGIONAL_SET: &str = "regional-blocklist";
/// Region stamped on records.
pub const REGION: &str = "us-east-1";

/// Primary rule list.
pub fn acl_a() -> ResourceId {
    ResourceId::new("acl-aaaa")
}

/// Second rule list sharing the IP sets.
pub fn acl_b() -> ResourceId {
    ResourceId::new("acl-bbbb")
}

/// Distinct host per index.
pub fn host(n: u16) -> Ipv4Addr {
    let [hi, lo] = n.to_be_bytes();
    Ipv4Addr::new(203, 0, hi, lo)
}

/// Mutating rule-list call, in the order it reached the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleCall {
    /// `create_rule`
    Create(ResourceId, Ipv4Addr, RuleNumber),
    /// `delete_rule`
    Delete(ResourceId, RuleNumber),
}

/// Delegates to an in-memory rule list and journals mutations.
pub struct RecordingRules {
    inner: Arc<InMemoryRuleList>,
    calls: Mutex<Vec<RuleCall>>,
}

impl RecordingRules {
    /// Wrap `inner`.
    pub fn new(inner: Arc<InMemoryRuleList>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Journal so far.
    pub fn calls(&self) -> Vec<RuleCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RuleListClient for RecordingRules {
    async fn list_rules(&self, resource_id: &ResourceId) -> Result<Vec<AclEntry>, BackendError> {
        self.inner.list_rules(resource_id).await
    }

    async fn create_rule(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError> {
        self.calls
            .lock()
            .push(RuleCall::Create(resource_id.clone(), host_ip, rule_number));
        self.inner.create_rule(resource_id, host_ip, rule_number).await
    }

    async fn delete_rule(
        &self,
        resource_id: &ResourceId,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError> {
        self.calls
            .lock()
            .push(RuleCall::Delete(resource_id.clone(), rule_number));
        self.inner.delete_rule(resource_id, rule_number).await
    }

    async fn resolve_resource_id(
        &self,
        boundary_ref: &str,
    ) -> Result<Option<ResourceId>, BackendError> {
        self.inner.resolve_resource_id(boundary_ref).await
    }
}

/// Engine plus direct handles on every backend.
pub struct World {
    /// Rule-list backend.
    pub rules: Arc<InMemoryRuleList>,
    /// Journal of rule-list mutations made by the engine.
    pub journal: Arc<RecordingRules>,
    /// Durable table.
    pub store: Arc<InMemoryStateStore>,
    /// Edge IP sets.
    pub edge: Arc<InMemoryIpSet>,
    /// Regional IP sets.
    pub regional: Arc<InMemoryIpSet>,
    /// Clock driving `inserted_at`.
    pub clock: Arc<ManualClock>,
    /// Engine under test.
    pub service: RotationService,
}

impl World {
    /// Two empty rule lists, `subnet-a`/`subnet-b` associated, clock at 1000.
    pub fn new() -> Self {
        let rules = Arc::new(InMemoryRuleList::new());
        for (subnet, acl) in [("subnet-a", acl_a()), ("subnet-b", acl_b())] {
            rules.add_resource(&acl);
            rules.associate(subnet, &acl);
        }
        let journal = Arc::new(RecordingRules::new(rules.clone()));
        let store = Arc::new(InMemoryStateStore::new());
        let edge = Arc::new(InMemoryIpSet::new(BlocklistScope::Edge));
        let regional = Arc::new(InMemoryIpSet::new(BlocklistScope::Regional));
        let clock = Arc::new(ManualClock::new(1_000));

        let config = RotationConfig {
            retry: RetryPolicy::no_retry(),
            ..RotationConfig::default()
        };
        let service = RotationService::new(
            journal.clone(),
            store.clone(),
            vec![
                BlocklistTarget::new(EDGE_SET, edge.clone()),
                BlocklistTarget::new(REGIONAL_SET, regional.clone()),
            ],
            clock.clone(),
            config,
        )
        .expect("default config is valid");

        Self {
            rules,
            journal,
            store,
            edge,
            regional,
            clock,
            service,
        }
    }

    /// Seed a consistent record, rule and IP set entries without the engine.
    pub fn seed(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        rule_number: RuleNumber,
        inserted_at: Timestamp,
    ) {
        self.store.insert_raw(BlockRecord {
            resource_id: resource_id.clone(),
            inserted_at,
            host_ip,
            rule_number,
            region: REGION.to_string(),
        });
        self.rules
            .insert_entry(resource_id, AclEntry::deny_host(host_ip, rule_number));
        self.edge.insert_raw(EDGE_SET, host_ip);
        self.regional.insert_raw(REGIONAL_SET, host_ip);
    }

    /// Whether both IP sets hold `host_ip`.
    pub fn blocklisted(&self, host_ip: Ipv4Addr) -> bool {
        self.edge.contains(EDGE_SET, host_ip) && self.regional.contains(REGIONAL_SET, host_ip)
    }

    /// Whether neither IP set holds `host_ip`.
    pub fn unlisted(&self, host_ip: Ipv4Addr) -> bool {
        !self.edge.contains(EDGE_SET, host_ip) && !self.regional.contains(REGIONAL_SET, host_ip)
    }

    /// Rule numbers recorded for a resource.
    pub fn durable_rules(&self, resource_id: &ResourceId) -> BTreeSet<RuleNumber> {
        self.store
            .all_records()
            .into_iter()
            .filter(|r| &r.resource_id == resource_id)
            .map(|r| r.rule_number)
            .collect()
    }

    /// Ingress rule numbers live on a resource.
    pub fn live_rules(&self, resource_id: &ResourceId) -> BTreeSet<RuleNumber> {
        self.rules
            .entries(resource_id)
            .into_iter()
            .filter(|e| e.direction == ns_01_blocklist_rotation::RuleDirection::Ingress)
            .map(|e| e.rule_number)
            .collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
