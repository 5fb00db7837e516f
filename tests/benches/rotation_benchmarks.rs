//! # Rotation Benchmarks
//!
//! | Path | Work |
//! |------|------|
//! | `plan_slot` | consistency gate + slot choice over a full partition |
//! | `reconcile` | full rotation against in-memory backends |
//! | `parse_event` | JSON decode + field extraction |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use ns_01_blocklist_rotation::{
    plan_slot, BlockRecord, BlocklistRotationApi, ReservedRange, ResourceId, StateSnapshot,
};
use ns_02_finding_intake::parse_event;
use ns_tests::fixtures::{acl_a, host, World, REGION};

fn snapshot(range: &ReservedRange, fill: usize) -> StateSnapshot {
    let resource_id = ResourceId::new("acl-bench");
    let records: Vec<BlockRecord> = range
        .iter()
        .take(fill)
        .enumerate()
        .map(|(i, rule_number)| BlockRecord {
            resource_id: resource_id.clone(),
            inserted_at: 1_000 + i as u64,
            host_ip: host(i as u16),
            rule_number,
            region: REGION.to_string(),
        })
        .collect();
    let live: BTreeSet<_> = records.iter().map(|r| r.rule_number).collect();
    StateSnapshot::new(resource_id, records, live)
}

fn bench_plan_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("ns-01-plan-slot");
    let range = ReservedRange::default();
    let target = Ipv4Addr::new(198, 51, 100, 1);

    for fill in [0usize, 5, 10] {
        let snap = snapshot(&range, fill);
        group.bench_with_input(BenchmarkId::new("occupied", fill), &snap, |b, snap| {
            b.iter(|| black_box(plan_slot(snap, &range, target)))
        });
    }

    // Wide range to see gate cost grow with capacity.
    let wide = ReservedRange::new(1_000, 1_999).unwrap();
    let full = snapshot(&wide, wide.capacity());
    group.throughput(Throughput::Elements(wide.capacity() as u64));
    group.bench_function("full_wide_range", |b| {
        b.iter(|| black_box(plan_slot(&full, &wide, target)))
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let world = World::new();
    runtime.block_on(async {
        for n in 0..10 {
            world.service.reconcile(&acl_a(), host(n), REGION).await.unwrap();
        }
    });

    let mut next = 10u16;
    c.bench_function("ns-01-reconcile-rotate", |b| {
        b.iter(|| {
            next = next.wrapping_add(1);
            world.clock.advance(1);
            runtime
                .block_on(world.service.reconcile(&acl_a(), host(next), REGION))
                .unwrap()
        })
    });
}

fn bench_parse_event(c: &mut Criterion) {
    let raw = serde_json::json!({
        "id": "evt-bench",
        "region": "us-east-1",
        "detail": {
            "type": "Recon:EC2/PortProbeUnprotectedPort",
            "resource": { "instanceDetails": {
                "instanceId": "i-bench",
                "networkInterfaces": [ { "subnetId": "subnet-a" } ]
            } },
            "service": { "action": { "portProbeAction": {
                "portProbeDetails": [ { "remoteIpDetails": { "ipAddressV4": "203.0.113.7" } } ]
            } } }
        }
    })
    .to_string();

    let mut group = c.benchmark_group("ns-02-intake");
    group.throughput(Throughput::Bytes(raw.len() as u64));
    group.bench_function("parse_event", |b| {
        b.iter(|| black_box(parse_event(black_box(&raw))))
    });
    group.finish();
}

criterion_group!(benches, bench_plan_slot, bench_reconcile, bench_parse_event);
criterion_main!(benches);
