//! The pruned search must return exactly what a linear scan returns.
//!
//! Covers all three variants, varying pivot counts and quantization levels,
//! self-matching, `k = N`, and determinism.

use rand::prelude::*;
use rand::rngs::StdRng;

use quantpivot::search::linear_scan;
use quantpivot::{Element, Matrix, Neighbors, QuantPivot, Variant};

fn random_flat(rng: &mut StdRng, n: usize, dim: usize) -> Vec<f64> {
    (0..n * dim).map(|_| rng.random_range(-10.0..10.0)).collect()
}

/// Gaussian-ish blobs, where pruning actually kicks in.
fn clustered_flat(rng: &mut StdRng, n: usize, dim: usize, clusters: usize) -> Vec<f64> {
    let centers: Vec<Vec<f64>> = (0..clusters)
        .map(|_| (0..dim).map(|_| rng.random_range(-100.0..100.0)).collect())
        .collect();
    let mut flat = Vec::with_capacity(n * dim);
    for _ in 0..n {
        let c = &centers[rng.random_range(0..clusters)];
        for &v in c {
            flat.push(v + rng.random_range(-1.0..1.0));
        }
    }
    flat
}

fn to_matrix<T: Element>(flat: &[f64], n: usize, dim: usize) -> Matrix<T> {
    let converted: Vec<T> = flat.iter().map(|&v| T::from_f64(v)).collect();
    Matrix::from_flat(&converted, n, dim).expect("valid shape")
}

fn assert_matches_linear_scan<T: Element>(
    dataset: &Matrix<T>,
    queries: &Matrix<T>,
    neighbors: &Neighbors<T>,
    k: usize,
) {
    assert_eq!(neighbors.num_queries(), queries.rows());
    assert_eq!(neighbors.k(), k);
    for q in 0..queries.rows() {
        let expected = linear_scan(dataset, queries.row(q), k);
        assert_eq!(neighbors.row(q), expected, "query {q}");
    }
}

fn run_variant<T: Element>(variant: Variant, flat: &[f64], n: usize, qflat: &[f64], nq: usize, dim: usize) {
    let dataset = to_matrix::<T>(flat, n, dim);
    let queries = to_matrix::<T>(qflat, nq, dim);

    for (h, x, k) in [(1, 1, 1), (4, 8, 5), (16, 32, 10), (n, 255, n)] {
        let mut engine = QuantPivot::<T>::for_variant(variant, 3).expect("engine");
        engine.fit(dataset.clone(), h, x, true).expect("fit");
        let neighbors = engine.predict(&queries, k, true).expect("predict");
        assert_matches_linear_scan(&dataset, &queries, &neighbors, k);
    }
}

#[test]
fn all_variants_match_linear_scan_uniform() {
    let mut rng = StdRng::seed_from_u64(42);
    let (n, nq, dim) = (300, 25, 9);
    let flat = random_flat(&mut rng, n, dim);
    let qflat = random_flat(&mut rng, nq, dim);

    run_variant::<f32>(Variant::Single, &flat, n, &qflat, nq, dim);
    run_variant::<f64>(Variant::Double, &flat, n, &qflat, nq, dim);
    run_variant::<f64>(Variant::DoubleParallel, &flat, n, &qflat, nq, dim);
}

#[test]
fn all_variants_match_linear_scan_clustered() {
    let mut rng = StdRng::seed_from_u64(7);
    let (n, nq, dim) = (500, 20, 16);
    let flat = clustered_flat(&mut rng, n, dim, 8);
    let qflat = clustered_flat(&mut rng, nq, dim, 8);

    run_variant::<f32>(Variant::Single, &flat, n, &qflat, nq, dim);
    run_variant::<f64>(Variant::Double, &flat, n, &qflat, nq, dim);
    run_variant::<f64>(Variant::DoubleParallel, &flat, n, &qflat, nq, dim);
}

#[test]
fn result_invariant_under_levels_and_pivots() {
    let mut rng = StdRng::seed_from_u64(1234);
    let (n, nq, dim) = (250, 15, 5);
    let dataset = to_matrix::<f64>(&clustered_flat(&mut rng, n, dim, 5), n, dim);
    let queries = to_matrix::<f64>(&random_flat(&mut rng, nq, dim), nq, dim);
    let k = 7;

    let mut reference: Option<Neighbors<f64>> = None;
    for h in [1, 2, 5, 20] {
        for x in [1, 2, 4, 16, 1024] {
            let mut engine = QuantPivot::sequential();
            engine.fit(dataset.clone(), h, x, true).unwrap();
            let got = engine.predict(&queries, k, true).unwrap();
            match &reference {
                None => reference = Some(got),
                Some(r) => assert_eq!(&got, r, "h={h} x={x}"),
            }
        }
    }
}

#[test]
fn self_match_at_distance_zero() {
    let mut rng = StdRng::seed_from_u64(99);
    let (n, dim) = (200, 6);
    let flat = random_flat(&mut rng, n, dim);

    for variant in Variant::ALL {
        if variant == Variant::Single {
            let dataset = to_matrix::<f32>(&flat, n, dim);
            let mut engine = QuantPivot::<f32>::for_variant(variant, 2).unwrap();
            engine.fit(dataset.clone(), 8, 16, true).unwrap();
            let neighbors = engine.predict(&dataset, 1, true).unwrap();
            for q in 0..n {
                assert_eq!(neighbors.ids_row(q), &[q as u32]);
                assert_eq!(neighbors.distances_row(q), &[0.0]);
            }
        } else {
            let dataset = to_matrix::<f64>(&flat, n, dim);
            let mut engine = QuantPivot::<f64>::for_variant(variant, 2).unwrap();
            engine.fit(dataset.clone(), 8, 16, true).unwrap();
            let neighbors = engine.predict(&dataset, 1, true).unwrap();
            for q in 0..n {
                assert_eq!(neighbors.ids_row(q), &[q as u32]);
                assert_eq!(neighbors.distances_row(q), &[0.0]);
            }
        }
    }
}

#[test]
fn k_equals_n_returns_everything_sorted() {
    let mut rng = StdRng::seed_from_u64(5);
    let (n, dim) = (60, 3);
    let dataset = to_matrix::<f64>(&random_flat(&mut rng, n, dim), n, dim);
    let queries = to_matrix::<f64>(&random_flat(&mut rng, 3, dim), 3, dim);

    let mut engine = QuantPivot::sequential();
    engine.fit(dataset, 4, 8, true).unwrap();
    let neighbors = engine.predict(&queries, n, true).unwrap();

    for q in 0..3 {
        let mut ids = neighbors.ids_row(q).to_vec();
        let dists = neighbors.distances_row(q);
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        ids.sort_unstable();
        assert_eq!(ids, (0..n as u32).collect::<Vec<_>>());
    }
}

#[test]
fn repeated_calls_are_identical() {
    let mut rng = StdRng::seed_from_u64(77);
    let (n, nq, dim) = (400, 30, 8);
    let flat = clustered_flat(&mut rng, n, dim, 4);
    let qflat = clustered_flat(&mut rng, nq, dim, 4);
    let dataset = to_matrix::<f64>(&flat, n, dim);
    let queries = to_matrix::<f64>(&qflat, nq, dim);

    let mut engine = QuantPivot::<f64>::for_variant(Variant::DoubleParallel, 4).unwrap();
    engine.fit(dataset.clone(), 6, 10, true).unwrap();
    let first = engine.predict(&queries, 12, true).unwrap();
    for _ in 0..3 {
        assert_eq!(engine.predict(&queries, 12, true).unwrap(), first);
    }

    // A fresh fit on the same data yields the same index and the same answers.
    let mut again = QuantPivot::<f64>::for_variant(Variant::DoubleParallel, 1).unwrap();
    again.fit(dataset, 6, 10, true).unwrap();
    assert_eq!(
        again.index().unwrap().pivots(),
        engine.index().unwrap().pivots()
    );
    assert_eq!(again.predict(&queries, 12, true).unwrap(), first);
}

#[test]
fn duplicate_points_tie_break_by_id() {
    let rows = vec![
        [5.0f64, 5.0],
        [1.0, 1.0],
        [5.0, 5.0],
        [1.0, 1.0],
        [9.0, 9.0],
    ];
    let dataset = Matrix::from_rows(&rows).unwrap();
    let queries = Matrix::from_rows(&[[1.0f64, 1.0], [5.0, 5.0]]).unwrap();

    let mut engine = QuantPivot::sequential();
    engine.fit(dataset, 3, 4, true).unwrap();
    let neighbors = engine.predict(&queries, 3, true).unwrap();

    assert_eq!(neighbors.ids_row(0), &[1, 3, 0]);
    assert_eq!(neighbors.ids_row(1), &[0, 2, 1]);
}
