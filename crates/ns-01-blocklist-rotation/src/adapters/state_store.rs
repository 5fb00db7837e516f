//! In-memory state table.
//!
//! Implements `BlockStateStore` over an ordered map keyed by
//! (`resource_id`, `inserted_at`), which gives partition range reads in sort
//! key order for free.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::fault::FaultInjector;
use crate::domain::{BackendError, BlockRecord, Operation, ResourceId, Timestamp};
use crate::ports::outbound::BlockStateStore;

type RecordKey = (ResourceId, Timestamp);

/// In-memory state table.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    records: RwLock<BTreeMap<RecordKey, BlockRecord>>,
    faults: FaultInjector,
}

impl InMemoryStateStore {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-filled with `records`; later duplicates of a key win.
    pub fn with_records(records: impl IntoIterator<Item = BlockRecord>) -> Self {
        let store = Self::new();
        {
            let mut table = store.records.write();
            for record in records {
                table.insert((record.resource_id.clone(), record.inserted_at), record);
            }
        }
        store
    }

    /// Every record, ordered by partition then sort key.
    pub fn all_records(&self) -> Vec<BlockRecord> {
        self.records.read().values().cloned().collect()
    }

    /// Insert directly, bypassing fault injection and key checks.
    pub fn insert_raw(&self, record: BlockRecord) {
        self.records
            .write()
            .insert((record.resource_id.clone(), record.inserted_at), record);
    }

    /// Number of records in one partition.
    pub fn count(&self, resource_id: &ResourceId) -> usize {
        self.records
            .read()
            .keys()
            .filter(|(id, _)| id == resource_id)
            .count()
    }

    /// Failure plan for this backend.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    fn partition(&self, resource_id: &ResourceId) -> Vec<BlockRecord> {
        let start = (resource_id.clone(), Timestamp::MIN);
        let end = (resource_id.clone(), Timestamp::MAX);
        self.records
            .read()
            .range(start..=end)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl BlockStateStore for InMemoryStateStore {
    async fn get(
        &self,
        resource_id: &ResourceId,
        inserted_at: Timestamp,
    ) -> Result<Option<BlockRecord>, BackendError> {
        self.faults.check(Operation::FindRecord)?;
        Ok(self
            .records
            .read()
            .get(&(resource_id.clone(), inserted_at))
            .cloned())
    }

    async fn find_by_host(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
    ) -> Result<Option<BlockRecord>, BackendError> {
        self.faults.check(Operation::FindRecord)?;
        Ok(self
            .partition(resource_id)
            .into_iter()
            .find(|r| r.host_ip == host_ip))
    }

    async fn records_for(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Vec<BlockRecord>, BackendError> {
        self.faults.check(Operation::LoadRecords)?;
        Ok(self.partition(resource_id))
    }

    async fn records_for_host(&self, host_ip: Ipv4Addr) -> Result<Vec<BlockRecord>, BackendError> {
        self.faults.check(Operation::ScanHost)?;
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.host_ip == host_ip)
            .cloned()
            .collect())
    }

    async fn put(&self, record: &BlockRecord) -> Result<(), BackendError> {
        self.faults.check(Operation::PutRecord)?;
        let key = (record.resource_id.clone(), record.inserted_at);
        let mut table = self.records.write();
        if table.contains_key(&key) {
            return Err(BackendError::Rejected(format!(
                "record {}@{} already exists",
                record.resource_id, record.inserted_at
            )));
        }
        table.insert(key, record.clone());
        Ok(())
    }

    async fn delete(
        &self,
        resource_id: &ResourceId,
        inserted_at: Timestamp,
    ) -> Result<(), BackendError> {
        self.faults.check(Operation::DeleteRecord)?;
        self.records.write().remove(&(resource_id.clone(), inserted_at));
        Ok(())
    }
}
