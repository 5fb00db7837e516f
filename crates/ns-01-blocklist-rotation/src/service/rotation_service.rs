//! Rotation Service
//!
//! Orchestrates one reconciliation across the rule list, the state table
//! and the IP sets.
//!
//! ## Write ordering
//!
//! ```text
//! evict:   delete rule ─→ delete record ─→ scan host ─→ (remove from IP sets)
//! install: create rule ─→ put record ─→ add to IP sets
//! ```
//!
//! Rule-list and state-table failures abort the run. A crash between the
//! two writes of a pair leaves a record without a rule (or the reverse),
//! which the consistency gate reports on the next run instead of reusing
//! the slot. IP-set failures are collected in the report and never abort.

use async_trait::async_trait;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::retry::with_retry;
use crate::algorithms::{is_still_active, next_inserted_at, plan_slot, SlotPlan};
use crate::domain::{
    BackendError, BlockRecord, BlocklistFailure, Operation, ReconcileOutcome, ReconcileReport,
    ReservedRange, ResourceId, RotationConfig, RotationError, StateSnapshot,
};
use crate::ports::{BlockStateStore, BlocklistRotationApi, Clock, RuleListClient, SetBlocklistClient};

/// An IP set the engine keeps in step with the rule list.
#[derive(Clone)]
pub struct BlocklistTarget {
    /// Configured set id passed to every call.
    pub set_id: String,
    /// Backend client.
    pub client: Arc<dyn SetBlocklistClient>,
}

impl BlocklistTarget {
    /// Bind a client to a set id.
    pub fn new(set_id: impl Into<String>, client: Arc<dyn SetBlocklistClient>) -> Self {
        Self {
            set_id: set_id.into(),
            client,
        }
    }
}

impl std::fmt::Debug for BlocklistTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlocklistTarget")
            .field("scope", &self.client.scope())
            .field("set_id", &self.set_id)
            .finish()
    }
}

/// Rotation engine.
///
/// Implements `BlocklistRotationApi` over injected outbound ports.
pub struct RotationService {
    rules: Arc<dyn RuleListClient>,
    store: Arc<dyn BlockStateStore>,
    blocklists: Vec<BlocklistTarget>,
    clock: Arc<dyn Clock>,
    config: RotationConfig,
}

impl RotationService {
    /// Create an engine; the configuration is validated here.
    pub fn new(
        rules: Arc<dyn RuleListClient>,
        store: Arc<dyn BlockStateStore>,
        blocklists: Vec<BlocklistTarget>,
        clock: Arc<dyn Clock>,
        config: RotationConfig,
    ) -> Result<Self, RotationError> {
        config.validate()?;
        Ok(Self {
            rules,
            store,
            blocklists,
            clock,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// IP sets driven by the engine.
    pub fn blocklists(&self) -> &[BlocklistTarget] {
        &self.blocklists
    }

    /// Read the partition and the live reserved slots.
    pub async fn load_snapshot(
        &self,
        resource_id: &ResourceId,
    ) -> Result<StateSnapshot, RotationError> {
        let store = &self.store;
        let rules = &self.rules;
        let range = &self.config.reserved_range;

        let records = self
            .call(Operation::LoadRecords, resource_id, false, move || {
                store.records_for(resource_id)
            })
            .await?;
        let live = self
            .call(Operation::ListRules, resource_id, false, move || {
                rules.list_reserved_rules(resource_id, range)
            })
            .await?;

        Ok(StateSnapshot::new(resource_id.clone(), records, live))
    }

    async fn execute(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        region: &str,
    ) -> Result<ReconcileReport, RotationError> {
        let store = &self.store;
        let rules = &self.rules;

        // Duplicate finding for a host already holding a slot.
        let existing = self
            .call(Operation::FindRecord, resource_id, false, move || {
                store.find_by_host(resource_id, host_ip)
            })
            .await?;
        if let Some(existing) = existing {
            info!(
                resource_id = %resource_id,
                host_ip = %host_ip,
                rule_number = existing.rule_number,
                inserted_at = existing.inserted_at,
                "[ns-01] host already blocked, nothing to do"
            );
            return Ok(ReconcileReport {
                resource_id: resource_id.clone(),
                host_ip,
                outcome: ReconcileOutcome::NoOp {
                    rule_number: existing.rule_number,
                },
                inserted_at: None,
                blocklist_failures: Vec::new(),
            });
        }

        let snapshot = self.load_snapshot(resource_id).await?;
        let plan = match plan_slot(&snapshot, &self.config.reserved_range, host_ip) {
            Ok(plan) => plan,
            Err(err) => {
                error!(
                    resource_id = %resource_id,
                    host_ip = %host_ip,
                    record_count = snapshot.record_count(),
                    durable = ?snapshot.durable_rules(),
                    live = ?snapshot.live_rules(),
                    range = %self.config.reserved_range,
                    error = %err,
                    "[ns-01] rule state check failed, refusing to mutate"
                );
                return Err(err);
            }
        };

        debug!(
            resource_id = %resource_id,
            record_count = snapshot.record_count(),
            live = ?snapshot.live_rules(),
            plan = ?plan,
            "[ns-01] slot planned"
        );

        let mut failures = Vec::new();
        let mut released = false;
        if let SlotPlan::Evict { victim, .. } = &plan {
            released = self.evict(victim, &mut failures).await?;
        }

        let evicted = matches!(plan, SlotPlan::Evict { .. });
        let rule_number = plan.rule_number();
        self.call(Operation::CreateRule, resource_id, evicted, move || {
            rules.create_rule(resource_id, host_ip, rule_number)
        })
        .await?;

        let inserted_at = next_inserted_at(self.clock.now_secs(), snapshot.newest_inserted_at());
        let record = BlockRecord {
            resource_id: resource_id.clone(),
            inserted_at,
            host_ip,
            rule_number,
            region: region.to_string(),
        };
        let record_ref = &record;
        self.call(Operation::PutRecord, resource_id, true, move || {
            store.put(record_ref)
        })
        .await?;

        self.update_blocklists(host_ip, Operation::AddHost, &mut failures)
            .await;

        let outcome = match plan {
            SlotPlan::Initialize { rule_number } | SlotPlan::Fill { rule_number } => {
                ReconcileOutcome::Inserted { rule_number }
            }
            SlotPlan::Evict {
                victim,
                rule_number,
            } => ReconcileOutcome::Rotated {
                rule_number,
                evicted: victim,
                released,
            },
        };

        let record_count = if evicted {
            snapshot.record_count()
        } else {
            snapshot.record_count() + 1
        };
        info!(
            resource_id = %resource_id,
            host_ip = %host_ip,
            rule_number,
            inserted_at,
            outcome = outcome.as_str(),
            record_count,
            blocklist_failures = failures.len(),
            "[ns-01] host blocked"
        );

        Ok(ReconcileReport {
            resource_id: resource_id.clone(),
            host_ip,
            outcome,
            inserted_at: Some(inserted_at),
            blocklist_failures: failures,
        })
    }

    /// Free the victim's slot. Returns whether the host was dropped from the
    /// IP sets.
    async fn evict(
        &self,
        victim: &BlockRecord,
        failures: &mut Vec<BlocklistFailure>,
    ) -> Result<bool, RotationError> {
        let resource_id = &victim.resource_id;
        let rule_number = victim.rule_number;
        let inserted_at = victim.inserted_at;
        let host_ip = victim.host_ip;
        let rules = &self.rules;
        let store = &self.store;

        info!(
            resource_id = %resource_id,
            evicted_host = %host_ip,
            rule_number,
            inserted_at,
            "[ns-01] evicting oldest rule"
        );

        // Scan before any delete: once the record is gone a failed scan would
        // leave the host listed with nothing referencing it.
        let host_records = self
            .call(Operation::ScanHost, resource_id, false, move || {
                store.records_for_host(host_ip)
            })
            .await?;

        // Rule first: a crash after this leaves a record pointing at a free
        // slot, which the gate reports instead of silently reusing.
        let deleted = with_retry(&self.config.retry, Operation::DeleteRule, move || {
            rules.delete_rule(resource_id, rule_number)
        })
        .await;
        match deleted {
            Ok(()) => {}
            Err(BackendError::NotFound(detail)) => {
                warn!(
                    resource_id = %resource_id,
                    rule_number,
                    detail = %detail,
                    "[ns-01] rule already absent during eviction"
                );
            }
            Err(source) => {
                error!(
                    resource_id = %resource_id,
                    rule_number,
                    error = %source,
                    "[ns-01] failed to delete evicted rule"
                );
                return Err(RotationError::Backend {
                    operation: Operation::DeleteRule,
                    resource_id: resource_id.clone(),
                    partial: false,
                    source,
                });
            }
        }

        self.call(Operation::DeleteRecord, resource_id, true, move || {
            store.delete(resource_id, inserted_at)
        })
        .await?;

        if is_still_active(victim, &host_records) {
            info!(
                evicted_host = %host_ip,
                references = host_records.len(),
                "[ns-01] evicted host still blocked elsewhere, keeping IP set entries"
            );
            return Ok(false);
        }

        self.update_blocklists(host_ip, Operation::RemoveHost, failures)
            .await;
        Ok(true)
    }

    /// Apply `operation` for `host_ip` to every IP set; failures are recorded.
    async fn update_blocklists(
        &self,
        host_ip: Ipv4Addr,
        operation: Operation,
        failures: &mut Vec<BlocklistFailure>,
    ) {
        for target in &self.blocklists {
            let client = &target.client;
            let set_id = target.set_id.as_str();
            let result = with_retry(&self.config.retry, operation, move || match operation {
                Operation::RemoveHost => client.remove_host(set_id, host_ip),
                _ => client.add_host(set_id, host_ip),
            })
            .await;

            match result {
                Ok(()) => debug!(
                    scope = %client.scope(),
                    set_id,
                    host_ip = %host_ip,
                    operation = %operation,
                    "[ns-01] IP set updated"
                ),
                Err(error) => {
                    warn!(
                        scope = %client.scope(),
                        set_id,
                        host_ip = %host_ip,
                        operation = %operation,
                        error = %error,
                        "[ns-01] IP set update failed, rule list and state kept"
                    );
                    failures.push(BlocklistFailure {
                        scope: client.scope(),
                        set_id: set_id.to_string(),
                        host_ip,
                        operation,
                        error,
                    });
                }
            }
        }
    }

    /// Retry a rule-list or state-table call and lift its failure.
    async fn call<T, F, Fut>(
        &self,
        operation: Operation,
        resource_id: &ResourceId,
        partial: bool,
        f: F,
    ) -> Result<T, RotationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        with_retry(&self.config.retry, operation, f)
            .await
            .map_err(|source| {
                error!(
                    resource_id = %resource_id,
                    operation = %operation,
                    partial,
                    error = %source,
                    "[ns-01] backend call failed"
                );
                RotationError::Backend {
                    operation,
                    resource_id: resource_id.clone(),
                    partial,
                    source,
                }
            })
    }
}

#[async_trait]
impl BlocklistRotationApi for RotationService {
    async fn reconcile(
        &self,
        resource_id: &ResourceId,
        host_ip: Ipv4Addr,
        region: &str,
    ) -> Result<ReconcileReport, RotationError> {
        info!(
            resource_id = %resource_id,
            host_ip = %host_ip,
            region,
            "[ns-01] reconcile requested"
        );
        self.execute(resource_id, host_ip, region).await
    }

    async fn resolve(&self, boundary_ref: &str) -> Result<Option<ResourceId>, RotationError> {
        let rules = &self.rules;
        let boundary = ResourceId::new(boundary_ref);
        self.call(Operation::ResolveResource, &boundary, false, move || {
            rules.resolve_resource_id(boundary_ref)
        })
        .await
    }

    fn reserved_range(&self) -> ReservedRange {
        self.config.reserved_range
    }
}
