//! Alignment engine benchmark
//!
//! Compares the two edit-distance variants on traces of growing length. The
//! full alignment keeps an n*m matrix and is the dominant cost of a
//! comparison; the quick variant keeps two rows.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench alignment_overhead
//! ```
//!
//! # Expected Output
//!
//! ```text
//! quick_distance/500      time:   [300 µs 310 µs 320 µs]
//! full_alignment/500      time:   [1.2 ms 1.3 ms 1.4 ms]
//! ```
//!
//! # Peer-Reviewed Foundation
//!
//! - **Wagner & Fischer (1974). "The String-to-String Correction Problem." JACM.**
//!   - Finding: edit distance in O(n*m) time by dynamic programming
//!   - Application: both variants; only the full one keeps the matrix

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rastro::alignment::{full_alignment, match_calls, quick_distance, CallEquality};
use rastro::divergence::{compare_trees, DetectorConfig};
use rastro::invocation::{Invocation, InvocationKind, InvocationTree};

/// Loop-shaped trace with a call marker every 16 entries.
fn synthetic_trace(len: usize, seed: i64) -> Vec<i64> {
    (0..len as i64)
        .map(|i| if i % 16 == 15 { -1 } else { (i * 7 + seed) % 23 })
        .collect()
}

/// Old trace with every 50th entry changed.
fn mutated(trace: &[i64]) -> Vec<i64> {
    trace
        .iter()
        .enumerate()
        .map(|(i, &v)| if i % 50 == 0 && v >= 0 { v + 1 } else { v })
        .collect()
}

fn bench_quick_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("quick_distance");

    for len in [50, 200, 500, 1000] {
        let new = synthetic_trace(len, 3);
        let old = mutated(&new);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| quick_distance(black_box(&new), black_box(&old), 0, &CallEquality::Any));
        });
    }

    group.finish();
}

fn bench_full_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_alignment");

    for len in [50, 200, 500, 1000] {
        let new = synthetic_trace(len, 3);
        let old = mutated(&new);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| full_alignment(black_box(&new), black_box(&old), &CallEquality::Any));
        });
    }

    group.finish();
}

fn bench_match_calls(c: &mut Criterion) {
    let new: Vec<String> = (0..200).map(|i| format!("m{}", i % 17)).collect();
    let old: Vec<String> = new.iter().step_by(2).cloned().collect();

    c.bench_function("match_calls_200", |b| {
        b.iter(|| match_calls(black_box(&new), black_box(&old)));
    });
}

/// Wide tree: one entry point with `fanout` calls, each with a short trace.
fn wide_tree(version: &str, fanout: usize, value_shift: i64) -> InvocationTree {
    let mut tree = InvocationTree::new(
        version,
        Invocation::new("bench.Main.run()V", "bench.Main", InvocationKind::Method),
    );
    let root = tree.root_id();
    for i in 0..fanout {
        let child = tree.push_call(
            root,
            Invocation::new(
                format!("bench.Worker.step{}()V", i % 8),
                "bench.Worker",
                InvocationKind::Method,
            ),
        );
        for idx in 0..32u32 {
            let shifted = if i % 10 == 0 { idx as i64 + value_shift } else { idx as i64 };
            tree.push_instruction(child, shifted as u32, "op");
        }
    }
    tree
}

fn bench_compare_trees(c: &mut Criterion) {
    let new = wide_tree("v2", 100, 1);
    let old = wide_tree("v1", 100, 0);
    let config = DetectorConfig::default();

    c.bench_function("compare_trees_fanout_100", |b| {
        b.iter(|| compare_trees(black_box(&new), black_box(&old), &config));
    });
}

criterion_group!(
    benches,
    bench_quick_distance,
    bench_full_alignment,
    bench_match_calls,
    bench_compare_trees
);
criterion_main!(benches);
