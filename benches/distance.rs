//! Benchmarks for the squared-L2 kernels.
//!
//! Dispatching kernels (SIMD where available) against the portable
//! 4-accumulator versions and a naive iterator sum.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::rngs::StdRng;

use quantpivot::distance::batch_squared_distances;
use quantpivot::simd;
use quantpivot::{Execution, Matrix};

fn naive_l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

// === Generators ===

fn random_vectors<T: quantpivot::Element>(n: usize, dim: usize) -> Vec<Vec<T>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            (0..dim)
                .map(|_| T::from_f64(rng.random_range(-1.0..1.0)))
                .collect()
        })
        .collect()
}

// === Benchmarks ===

fn bench_l2_f32(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_squared_f32");

    for dim in [4, 64, 128, 384, 768, 1536].iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let vectors = random_vectors::<f32>(2, *dim);
        let a = &vectors[0];
        let b = &vectors[1];

        group.bench_with_input(BenchmarkId::new("dispatch", dim), dim, |bench, _| {
            bench.iter(|| simd::l2_distance_squared_f32(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("portable", dim), dim, |bench, _| {
            bench.iter(|| simd::l2_distance_squared_f32_portable(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("naive", dim), dim, |bench, _| {
            bench.iter(|| naive_l2_squared(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

fn bench_l2_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_squared_f64");

    for dim in [4, 64, 128, 384, 768, 1536].iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let vectors = random_vectors::<f64>(2, *dim);
        let a = &vectors[0];
        let b = &vectors[1];

        group.bench_with_input(BenchmarkId::new("dispatch", dim), dim, |bench, _| {
            bench.iter(|| simd::l2_distance_squared_f64(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("portable", dim), dim, |bench, _| {
            bench.iter(|| simd::l2_distance_squared_f64_portable(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_squared_distances");
    let dim = 128;

    for n in [1_000, 10_000, 50_000].iter() {
        group.throughput(Throughput::Elements(*n as u64));

        let rows = random_vectors::<f32>(*n, dim);
        let matrix = Matrix::from_rows(&rows).unwrap();
        let reference = rows[0].clone();
        let mut out = vec![0.0f32; *n];

        group.bench_with_input(BenchmarkId::new("sequential", n), n, |bench, _| {
            bench.iter(|| {
                batch_squared_distances(
                    black_box(&reference),
                    &matrix,
                    &mut out,
                    Execution::Sequential,
                )
            });
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), n, |bench, _| {
            bench.iter(|| {
                batch_squared_distances(
                    black_box(&reference),
                    &matrix,
                    &mut out,
                    Execution::Parallel { threads: 0 },
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_l2_f32, bench_l2_f64, bench_batch);
criterion_main!(benches);
