//! # QC-18 Slasher Addressing Benchmarks
//!
//! Hot path of every span read/write:
//! - `cell_index` / `flat_slice_id`: a handful of integer ops, expect < 10ns
//! - `validator_indices_in_chunk`: O(validator_chunk_size) allocation
//! - `apply_updates`: one load/save per touched chunk for a committee batch
//!
//! ```bash
//! cargo bench --package qc-18-slasher --bench addressing
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_slasher::{
    ChunkKind, Epoch, InMemoryKVStore, Parameters, SpanIndexApi, SpanIndexService, SpanUpdate,
    ValidatorIndex,
};

fn bench_addressing(c: &mut Criterion) {
    let params = Parameters::default();
    let mut group = c.benchmark_group("qc-18/addressing");

    group.bench_function("cell_index", |b| {
        b.iter(|| params.cell_index(black_box(ValidatorIndex(123_456)), black_box(Epoch(98_765))))
    });

    group.bench_function("flat_slice_id", |b| {
        b.iter(|| {
            params.flat_slice_id(black_box(ValidatorIndex(123_456)), black_box(Epoch(98_765)))
        })
    });

    group.bench_function("validator_indices_in_chunk", |b| {
        b.iter(|| params.validator_indices_in_chunk(black_box(482)))
    });

    group.finish();
}

fn bench_committee_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/apply_updates");

    for committee in [64u64, 512, 4096] {
        let updates: Vec<_> = (0..committee)
            .map(|v| SpanUpdate::new(ValidatorIndex(v * 3), Epoch(5_000), (v % 100) as u16))
            .collect();
        group.throughput(Throughput::Elements(committee));
        group.bench_with_input(
            BenchmarkId::from_parameter(committee),
            &updates,
            |b, updates| {
                let service = SpanIndexService::new(Parameters::default(), InMemoryKVStore::new())
                    .expect("default layout is valid");
                b.iter(|| {
                    service
                        .apply_updates(ChunkKind::MinSpan, black_box(updates), Epoch(5_000))
                        .map_err(|e| e.to_string())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_addressing, bench_committee_updates);
criterion_main!(benches);
