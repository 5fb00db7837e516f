//! In-memory ordered rule list.
//!
//! Implements `RuleListClient` with the semantics of a cloud network ACL:
//! numbered entries per direction, one entry per (direction, number), and
//! subnet associations used for resource resolution.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::debug;

use super::fault::FaultInjector;
use crate::domain::{
    AclEntry, BackendError, Operation, ResourceId, RuleDirection, RuleNumber,
};
use crate::ports::outbound::RuleListClient;

type EntryKey = (u8, RuleNumber);

fn entry_key(direction: RuleDirection, rule_number: RuleNumber) -> EntryKey {
    let dir = match direction {
        RuleDirection::Ingress => 0,
        RuleDirection::Egress => 1,
    };
    (dir, rule_number)
}

/// Serializable image of every rule list and subnet association.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleListSnapshot {
    /// Subnet id → rule-list resource.
    #[serde(default)]
    pub associations: BTreeMap<String, ResourceId>,
    /// Resource → entries.
    #[serde(default)]
    pub rule_lists: BTreeMap<ResourceId, Vec<AclEntry>>,
}

/// In-memory network ACL backend.
#[derive(Debug, Default)]
pub struct InMemoryRuleList {
    lists: RwLock<BTreeMap<ResourceId, BTreeMap<EntryKey, AclEntry>>>,
    associations: RwLock<BTreeMap<String, ResourceId>>,
    faults: FaultInjector,
}

impl InMemoryRuleList {
    /// Empty backend with no resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a snapshot.
    pub fn from_snapshot(snapshot: RuleListSnapshot) -> Self {
        let backend = Self::new();
        *backend.associations.write() = snapshot.associations;
        {
            let mut lists = backend.lists.write();
            for (resource_id, entries) in snapshot.rule_lists {
                let list = lists.entry(resource_id).or_default();
                for entry in entries {
                    list.insert(entry_key(entry.direction, entry.rule_number), entry);
                }
            }
        }
        backend
    }

    /// Export current state.
    pub fn snapshot(&self) -> RuleListSnapshot {
        RuleListSnapshot {
            associations: self.associations.read().clone(),
            rule_lists: self
                .lists
                .read()
                .iter()
                .map(|(id, list)| (id.clone(), list.values().cloned().collect()))
                .collect(),
        }
    }

    /// Create an empty rule list (no-op if it exists).
    pub fn add_resource(&self, resource_id: &ResourceId) {
        self.lists.write().entry(resource_id.clone()).or_default();
    }

    /// Associate a subnet with a rule list, creating the list if needed.
    pub fn associate(&self, boundary_ref: &str, resource_id: &ResourceId) {
        self.add_resource(resource_id);
        self.associations
            .write()
            .insert(boundary_ref.to_string(), resource_id.clone());
    }

    /// Seed an arbitrary entry, e.g. a manual rule inside the reserved range.
    pub fn insert_entry(&self, resource_id: &ResourceId, entry: AclEntry) {
        self.lists
            .write()
            .entry(resource_id.clone())
            .or_default()
            .insert(entry_key(entry.direction, entry.rule_number), entry);
    }

    /// Remove an entry directly, bypassing fault injection.
    pub fn remove_entry(
        &self,
        resource_id: &ResourceId,
        direction: RuleDirection,
        rule_number: RuleNumber,
    ) -> Option<AclEntry> {
        self.lists
            .write()
            .get_mut(resource_id)
            .and_then(|list| list.remove(&entry_key(direction, rule_number)))
    }

    /// Ingress entry at a slot.
    pub fn ingress_entry(&self, resource_id: &ResourceId, rule_number: RuleNumber) -> Option<AclEntry> {
        self.lists
            .read()
            .get(resource_id)
            .and_then(|list| list.get(&entry_key(RuleDirection::Ingress, rule_number)))
            .cloned()
    }

    /// Every entry of a resource, ordered by direction then number.
    pub fn entries(&self, resource_id: &ResourceId) -> Vec<AclEntry> {
        self.lists
            .read()
            .get(resource_id)
            .map(|list| list.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Failure plan for this backend.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }
}

#[async_trait]
impl RuleListClient for InMemoryRuleList {
    async fn list_rules(&self, resource_id: &ResourceId) -> Result<Vec<AclEntry>, BackendError> {
        self.faults.check(Operation::ListRules)?;
        self.lists
            .read()
            .get(resource_id)
            .map(|list| list.values().cloned().collect())
            .ok_or_else(|| BackendError::NotFound(format!("rule list {}", resource_id)))
    }

    async fn create_rule(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError> {
        self.faults.check(Operation::CreateRule)?;
        let mut lists = self.lists.write();
        let list = lists
            .get_mut(resource_id)
            .ok_or_else(|| BackendError::NotFound(format!("rule list {}", resource_id)))?;

        let key = entry_key(RuleDirection::Ingress, rule_number);
        if list.contains_key(&key) {
            return Err(BackendError::SlotOccupied {
                resource_id: resource_id.clone(),
                rule_number,
            });
        }
        list.insert(key, AclEntry::deny_host(host_ip, rule_number));
        debug!("[ns-01] rule {} on {} now denies {}/32", rule_number, resource_id, host_ip);
        Ok(())
    }

    async fn delete_rule(
        &self,
        resource_id: &ResourceId,
        rule_number: RuleNumber,
    ) -> Result<(), BackendError> {
        self.faults.check(Operation::DeleteRule)?;
        let mut lists = self.lists.write();
        let list = lists
            .get_mut(resource_id)
            .ok_or_else(|| BackendError::NotFound(format!("rule list {}", resource_id)))?;

        list.remove(&entry_key(RuleDirection::Ingress, rule_number))
            .map(|_| ())
            .ok_or_else(|| {
                BackendError::NotFound(format!("rule {} on {}", rule_number, resource_id))
            })
    }

    async fn resolve_resource_id(
        &self,
        boundary_ref: &str,
    ) -> Result<Option<ResourceId>, BackendError> {
        self.faults.check(Operation::ResolveResource)?;
        Ok(self.associations.read().get(boundary_ref).cloned())
    }
}
