//! Merge throughput benchmarks.
//!
//! Run with: `cargo bench --bench merge`
//!
//! Traces share a common greeting prefix and then wander over a bounded
//! state space, so most turns collapse into existing nodes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use trace_dedup_graph::{build_merged_graph, union_graphs, Graph, Trace};

const STATES: u32 = 64;

fn state(turn: &u32) -> serde_json::Value {
    json!({ "response": turn % STATES })
}

/// Deterministic pseudo-random traces.
fn make_traces(count: usize, len: usize) -> Vec<Graph<u32>> {
    let mut seed: u32 = 0x9e37_79b9;
    (0..count)
        .map(|i| {
            let turns: Vec<u32> = (0..len)
                .map(|j| {
                    if j == 0 {
                        return 0;
                    }
                    seed ^= seed << 13;
                    seed ^= seed >> 17;
                    seed ^= seed << 5;
                    seed
                })
                .collect();
            Trace::new(format!("bench-{i}"), turns).into_graph(&state).unwrap()
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_merged_graph");

    for trace_count in [10, 100, 1000] {
        let len = 20;
        group.throughput(Throughput::Elements((trace_count * len) as u64));
        group.bench_with_input(
            BenchmarkId::new("traces", trace_count),
            &trace_count,
            |b, &trace_count| {
                b.iter_batched(
                    || make_traces(trace_count, len),
                    |traces| {
                        let graph = build_merged_graph(black_box(traces), |_, _| Ok(())).unwrap();
                        assert!(graph.num_nodes() <= STATES as usize);
                        graph
                    },
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_graphs");

    for trace_count in [10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("traces", trace_count),
            &trace_count,
            |b, &trace_count| {
                b.iter_batched(
                    || make_traces(trace_count, 20),
                    |traces| union_graphs(black_box(traces)),
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_union);
criterion_main!(benches);
