use std::collections::BTreeMap;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use warehouse_core::{ProductId, WarehouseId, ZoneId};
use warehouse_infra::engine::{EngineOptions, InventoryEngine, Transfer};
use warehouse_infra::store::InMemoryInventoryStore;
use warehouse_inventory::Location;

fn setup(
    options: EngineOptions,
    products: usize,
) -> (InventoryEngine<InMemoryInventoryStore>, Vec<ProductId>) {
    let engine = InventoryEngine::with_options(InMemoryInventoryStore::seeded(), options);
    let ids = (0..products)
        .map(|i| {
            let id = engine
                .add_product("Bench item", &format!("BENCH-{i}"), Decimal::ONE)
                .unwrap();
            engine
                .stock_in(id, Location::warehouse(WarehouseId::new(1)), 1_000_000)
                .unwrap();
            id
        })
        .collect();
    (engine, ids)
}

fn bench_transfer_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_latency");
    let from = Location::warehouse(WarehouseId::new(1));
    let to = Location::zone(WarehouseId::new(1), ZoneId::new(2));

    for (label, atomic) in [("atomic", true), ("two_writes", false)] {
        group.bench_function(label, |b| {
            let options = EngineOptions {
                atomic_transfers: atomic,
                ..EngineOptions::default()
            };
            // Alternate direction so the source never runs dry.
            let (engine, ids) = setup(options, 1);
            let mut forward = true;
            b.iter(|| {
                let (src, dst) = if forward { (from, to) } else { (to, from) };
                forward = !forward;
                engine
                    .transfer(&Transfer::new(ids[0], src, dst, black_box(5)))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_reconcile_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_throughput");

    for entries in [1usize, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*entries as u64));
        group.bench_with_input(
            BenchmarkId::new("entries", entries),
            entries,
            |b, &size| {
                let (engine, ids) = setup(EngineOptions::default(), size);
                let mut round = 0u64;
                b.iter(|| {
                    round += 1;
                    let counted: BTreeMap<ProductId, u64> =
                        ids.iter().map(|id| (*id, round % 7)).collect();
                    black_box(engine.reconcile(WarehouseId::new(1), &counted).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transfer_latency, bench_reconcile_throughput);
criterion_main!(benches);
