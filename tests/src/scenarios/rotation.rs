//! # Rotation Scenarios
//!
//! Cross-store behaviour of the rotation engine over in-memory backends:
//!
//! 1. Idempotency of repeated findings
//! 2. Capacity bound over arbitrary host sequences
//! 3. FIFO eviction with exact slot reuse
//! 4. Consistency gate with zero mutations
//! 5. Still-active suppression across rule lists
//! 6. Round trip on an empty resource and the full-resource rotation

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    use ns_01_blocklist_rotation::{
        AclEntry, BackendError, BlockRecord, BlocklistRotationApi, BlocklistScope, Operation, ReconcileOutcome,
        ReservedRange, RotationError, RuleAction, RuleDirection,
    };
    use proptest::prelude::*;

    use crate::fixtures::{acl_a, acl_b, host, RuleCall, World, REGION};

    // =============================================================================
    // IDEMPOTENCY
    // =============================================================================

    #[tokio::test]
    async fn test_repeat_finding_is_noop() {
        let world = World::new();
        let first = world
            .service
            .reconcile(&acl_a(), host(1), REGION)
            .await
            .unwrap();
        world.clock.advance(30);
        let second = world
            .service
            .reconcile(&acl_a(), host(1), REGION)
            .await
            .unwrap();

        assert_eq!(first.outcome, ReconcileOutcome::Inserted { rule_number: 71 });
        assert_eq!(second.outcome, ReconcileOutcome::NoOp { rule_number: 71 });
        assert!(!second.outcome.mutated());
        assert_eq!(world.store.count(&acl_a()), 1);
        assert_eq!(world.rules.entries(&acl_a()).len(), 1);
        assert_eq!(world.journal.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_same_host_on_two_resources_gets_two_slots() {
        let world = World::new();
        world.service.reconcile(&acl_a(), host(1), REGION).await.unwrap();
        let other = world.service.reconcile(&acl_b(), host(1), REGION).await.unwrap();
        assert_eq!(other.outcome, ReconcileOutcome::Inserted { rule_number: 71 });
        let for_host = world
            .store
            .all_records()
            .into_iter()
            .filter(|r| r.host_ip == host(1))
            .count();
        assert_eq!(for_host, 2);
    }

    // =============================================================================
    // CAPACITY
    // =============================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_count_never_exceeds_capacity(hosts in proptest::collection::vec(0u16..64, 10..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let range = ReservedRange::default();

            runtime.block_on(async {
                let world = World::new();
                for n in hosts {
                    world.service.reconcile(&acl_a(), host(n), REGION).await.unwrap();
                    world.clock.advance(1);

                    let durable = world.durable_rules(&acl_a());
                    prop_assert!(world.store.count(&acl_a()) <= range.capacity());
                    prop_assert!(durable.iter().all(|rule| range.contains(*rule)));
                    prop_assert_eq!(&durable, &world.live_rules(&acl_a()));
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }

    #[tokio::test]
    async fn test_sequential_fill_uses_every_slot_once() {
        let world = World::new();
        for n in 0..10 {
            let report = world.service.reconcile(&acl_a(), host(n), REGION).await.unwrap();
            assert_eq!(report.outcome.rule_number(), 71 + n);
        }
        let expected: BTreeSet<u16> = (71..=80).collect();
        assert_eq!(world.durable_rules(&acl_a()), expected);
        assert_eq!(world.live_rules(&acl_a()), expected);
    }

    #[tokio::test]
    async fn test_live_rules_over_capacity_is_sync_fault() {
        let world = World::new();
        for n in 0..10u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        // Corrupt durable side: an eleventh record on an already used slot.
        world.store.insert_raw(BlockRecord {
            resource_id: acl_a(),
            inserted_at: 50,
            host_ip: host(99),
            rule_number: 75,
            region: REGION.to_string(),
        });
        let err = world
            .service
            .reconcile(&acl_a(), host(200), REGION)
            .await
            .unwrap_err();
        assert!(matches!(err, RotationError::CapacityExceeded { count: 11, capacity: 10, .. }));
        assert!(err.is_sync_fault());
    }

    // =============================================================================
    // FIFO
    // =============================================================================

    #[tokio::test]
    async fn test_full_resource_evicts_smallest_inserted_at() {
        let world = World::new();
        // Slots assigned out of time order: oldest record sits on rule 76.
        let order: [(u16, u16, u64); 10] = [
            (0, 71, 40),
            (1, 72, 35),
            (2, 73, 50),
            (3, 74, 45),
            (4, 75, 60),
            (5, 76, 10),
            (6, 77, 55),
            (7, 78, 20),
            (8, 79, 30),
            (9, 80, 25),
        ];
        for (n, rule, ts) in order {
            world.seed(&acl_a(), host(n), rule, ts);
        }

        let report = world
            .service
            .reconcile(&acl_a(), host(500), REGION)
            .await
            .unwrap();

        match &report.outcome {
            ReconcileOutcome::Rotated {
                rule_number,
                evicted,
                ..
            } => {
                assert_eq!(*rule_number, 76);
                assert_eq!(evicted.host_ip, host(5));
                assert_eq!(evicted.inserted_at, 10);
            }
            other => panic!("expected rotation, got {other:?}"),
        }
        assert_eq!(world.store.count(&acl_a()), 10);
        assert_eq!(
            world.rules.ingress_entry(&acl_a(), 76),
            Some(AclEntry::deny_host(host(500), 76))
        );
        // The new record sorts last.
        assert!(report.inserted_at.unwrap() > 60);
    }

    #[tokio::test]
    async fn test_rotation_keeps_cycling_through_slots() {
        let world = World::new();
        for n in 0..25u16 {
            world.service.reconcile(&acl_a(), host(n), REGION).await.unwrap();
            world.clock.advance(1);
        }
        // Only the ten most recent hosts remain.
        let remaining: BTreeSet<Ipv4Addr> = world
            .store
            .all_records()
            .into_iter()
            .map(|r| r.host_ip)
            .collect();
        let expected: BTreeSet<Ipv4Addr> = (15..25).map(host).collect();
        assert_eq!(remaining, expected);
        assert!(world.unlisted(host(0)));
        assert!(world.blocklisted(host(24)));
    }

    // =============================================================================
    // CONSISTENCY GATE
    // =============================================================================

    #[tokio::test]
    async fn test_orphan_rule_blocks_every_attempt_without_mutation() {
        let world = World::new();
        for n in 0..4u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        // Drift: a live rule with no record.
        world
            .rules
            .insert_entry(&acl_a(), AclEntry::deny_host(host(77), 78));

        let rules_before = world.rules.snapshot();
        let records_before = world.store.all_records();
        let edge_before = world.edge.snapshot();
        let regional_before = world.regional.snapshot();

        for n in [100u16, 101, 102] {
            let err = world
                .service
                .reconcile(&acl_a(), host(n), REGION)
                .await
                .unwrap_err();
            match err {
                RotationError::SyncMismatch {
                    durable,
                    live,
                    record_count,
                    ..
                } => {
                    assert_eq!(durable, vec![71, 72, 73, 74]);
                    assert_eq!(live, vec![71, 72, 73, 74, 78]);
                    assert_eq!(record_count, 4);
                }
                other => panic!("expected mismatch, got {other:?}"),
            }
        }

        assert_eq!(world.rules.snapshot(), rules_before);
        assert_eq!(world.store.all_records(), records_before);
        assert_eq!(world.edge.snapshot(), edge_before);
        assert_eq!(world.regional.snapshot(), regional_before);
        assert!(world.journal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_rule_for_record_is_sync_fault() {
        let world = World::new();
        world.seed(&acl_a(), host(1), 71, 1);
        world.seed(&acl_a(), host(2), 72, 2);
        world
            .rules
            .remove_entry(&acl_a(), RuleDirection::Ingress, 72);

        let err = world
            .service
            .reconcile(&acl_a(), host(3), REGION)
            .await
            .unwrap_err();
        assert!(err.is_sync_fault());
        assert_eq!(world.store.count(&acl_a()), 2);
    }

    #[tokio::test]
    async fn test_rules_without_any_records_refuse_first_insert() {
        let world = World::new();
        world
            .rules
            .insert_entry(&acl_a(), AclEntry::deny_host(host(9), 71));
        let err = world
            .service
            .reconcile(&acl_a(), host(1), REGION)
            .await
            .unwrap_err();
        assert!(matches!(err, RotationError::PreexistingRules { ref live, .. } if live == &vec![71]));
        assert!(world.journal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rules_outside_range_and_egress_are_ignored() {
        let world = World::new();
        world
            .rules
            .insert_entry(&acl_a(), AclEntry::deny_host(host(9), 100));
        world.rules.insert_entry(
            &acl_a(),
            AclEntry {
                direction: RuleDirection::Egress,
                action: RuleAction::Allow,
                ..AclEntry::deny_host(host(9), 71)
            },
        );
        let report = world
            .service
            .reconcile(&acl_a(), host(1), REGION)
            .await
            .unwrap();
        assert_eq!(report.outcome, ReconcileOutcome::Inserted { rule_number: 71 });
    }

    // =============================================================================
    // STILL-ACTIVE SUPPRESSION
    // =============================================================================

    #[tokio::test]
    async fn test_evicted_host_blocked_elsewhere_stays_listed() {
        let world = World::new();
        for n in 0..10u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        // host(0) was re-blocked on another rule list later.
        world.seed(&acl_b(), host(0), 71, 500);

        let report = world
            .service
            .reconcile(&acl_a(), host(300), REGION)
            .await
            .unwrap();

        assert!(matches!(
            report.outcome,
            ReconcileOutcome::Rotated { released: false, .. }
        ));
        assert!(world.blocklisted(host(0)));
        assert!(world.blocklisted(host(300)));
    }

    #[tokio::test]
    async fn test_evicted_host_without_references_is_released() {
        let world = World::new();
        for n in 0..10u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        let report = world
            .service
            .reconcile(&acl_a(), host(300), REGION)
            .await
            .unwrap();
        assert!(matches!(
            report.outcome,
            ReconcileOutcome::Rotated { released: true, .. }
        ));
        assert!(world.unlisted(host(0)));
    }

    // =============================================================================
    // ROUND TRIPS
    // =============================================================================

    #[tokio::test]
    async fn test_empty_resource_round_trip() {
        let world = World::new();
        let target = Ipv4Addr::new(10, 0, 0, 5);

        let report = world
            .service
            .reconcile(&acl_a(), target, REGION)
            .await
            .unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::Inserted { rule_number: 71 });
        let records = world.store.all_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rule_number, 71);
        assert_eq!(records[0].host_ip, target);
        assert_eq!(records[0].region, REGION);

        let entry = world.rules.ingress_entry(&acl_a(), 71).unwrap();
        assert_eq!(entry.cidr, "10.0.0.5/32");
        assert_eq!(entry.direction, RuleDirection::Ingress);
        assert_eq!(entry.action, RuleAction::Deny);
        assert!(world.blocklisted(target));
    }

    #[tokio::test]
    async fn test_full_resource_end_to_end() {
        let world = World::new();
        for n in 0..10u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        let b = Ipv4Addr::new(198, 51, 100, 200);

        let report = world.service.reconcile(&acl_a(), b, REGION).await.unwrap();

        assert_eq!(
            world.journal.calls(),
            vec![
                RuleCall::Delete(acl_a(), 71),
                RuleCall::Create(acl_a(), b, 71),
            ]
        );
        let records = world.store.all_records();
        assert!(records.iter().all(|r| r.host_ip != host(0)));
        let new_record = records.iter().find(|r| r.host_ip == b).unwrap();
        assert_eq!(new_record.rule_number, 71);
        assert_eq!(Some(new_record.inserted_at), report.inserted_at);
        assert!(world.unlisted(host(0)));
        assert!(world.blocklisted(b));
        for n in 1..10u16 {
            assert!(world.blocklisted(host(n)));
        }
    }

    // =============================================================================
    // FAULTS
    // =============================================================================

    #[tokio::test]
    async fn test_blocklist_outage_is_reported_not_fatal() {
        let world = World::new();
        world.regional.faults().fail_always(
            Operation::AddHost,
            BackendError::Unavailable("regional outage".into()),
        );
        let report = world
            .service
            .reconcile(&acl_a(), host(1), REGION)
            .await
            .unwrap();
        assert!(report.is_degraded());
        assert_eq!(report.blocklist_failures[0].scope, BlocklistScope::Regional);
        assert!(world.edge.contains(crate::fixtures::EDGE_SET, host(1)));
        assert_eq!(world.store.count(&acl_a()), 1);
    }

    #[tokio::test]
    async fn test_record_delete_failure_leaves_detectable_drift() {
        let world = World::new();
        for n in 0..10u16 {
            world.seed(&acl_a(), host(n), 71 + n, u64::from(n));
        }
        world.store.faults().fail_times(
            Operation::DeleteRecord,
            1,
            BackendError::Unavailable("table throttled".into()),
        );

        let err = world
            .service
            .reconcile(&acl_a(), host(400), REGION)
            .await
            .unwrap_err();
        assert!(err.is_partial());
        // Rule 71 is gone but its record is not.
        assert!(world.rules.ingress_entry(&acl_a(), 71).is_none());
        assert_eq!(world.store.count(&acl_a()), 10);

        let err = world
            .service
            .reconcile(&acl_a(), host(401), REGION)
            .await
            .unwrap_err();
        assert!(err.is_sync_fault());
    }
}
