//! Bound-pruned exact k-NN search over an [`IndexStore`].
//!
//! # Algorithm
//!
//! For a query `q`:
//!
//! 1. Compute the reference distances `d(q, p_i)` to all pivots.
//! 2. For each point `j`, the stored code of pivot `i` bounds `d(j, p_i)` to
//!    `[lo_ij, hi_ij]`. The triangle inequality then gives
//!    `d(q, j) >= max(0, d(q, p_i) - hi_ij, lo_ij - d(q, p_i))`; the lower bound
//!    `LB_j` is the largest of these over the non-degenerate pivots.
//! 3. Visit points in ascending `(LB_j, j)`, computing exact distances into a
//!    bounded max-heap of size `k`.
//! 4. Stop as soon as the heap is full and the next `LB_j` is strictly greater
//!    than the worst kept distance. Every later point is at least as far, so
//!    nothing can still enter. Equality keeps scanning: an equal distance with
//!    a lower id must still be able to displace the worst entry.
//!
//! Pruning only decides how many exact distances are computed. A point enters
//! the result solely through its exact distance, so the result equals a full
//! linear scan for any pivot count and any number of quantization levels.
//!
//! # Rounding
//!
//! Bounds are widened by `T::BOUND_SLACK * (max_i + d(q, p_i))` so kernel and
//! square-root rounding can never push a computed bound above the computed
//! exact distance of the same point.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::config::Execution;
use crate::distance::{batch_squared_distances, squared_distance};
use crate::element::Element;
use crate::error::{QuantPivotError, Result};
use crate::index::IndexStore;
use crate::matrix::Matrix;
use crate::progress::{Progress, ProgressEvent};

/// Work counters for one or more queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Points considered (`N` per query).
    pub candidates: usize,
    /// Exact distances computed.
    pub exact: usize,
}

impl QueryStats {
    fn merge(self, other: Self) -> Self {
        Self {
            candidates: self.candidates + other.candidates,
            exact: self.exact + other.exact,
        }
    }

    /// Fraction of candidates that were not refined.
    pub fn pruned_fraction(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        1.0 - self.exact as f64 / self.candidates as f64
    }
}

/// k-NN results for a batch of queries, shaped `(num_queries, k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors<T: Element> {
    ids: Vec<u32>,
    distances: Vec<T>,
    k: usize,
}

impl<T: Element> Neighbors<T> {
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.ids.len() / self.k
        }
    }

    /// Flat row-major ids.
    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Flat row-major distances, aligned with [`Neighbors::ids`].
    #[inline]
    pub fn distances(&self) -> &[T] {
        &self.distances
    }

    #[inline]
    pub fn ids_row(&self, query: usize) -> &[u32] {
        &self.ids[query * self.k..(query + 1) * self.k]
    }

    #[inline]
    pub fn distances_row(&self, query: usize) -> &[T] {
        &self.distances[query * self.k..(query + 1) * self.k]
    }

    /// `(id, distance)` pairs of one query.
    pub fn row(&self, query: usize) -> Vec<(u32, T)> {
        self.ids_row(query)
            .iter()
            .copied()
            .zip(self.distances_row(query).iter().copied())
            .collect()
    }

    pub fn into_parts(self) -> (Vec<u32>, Vec<T>) {
        (self.ids, self.distances)
    }
}

/// Heap entry ordered by `(distance, id)`.
#[derive(Debug, Clone, Copy)]
struct Candidate<T> {
    dist: T,
    id: u32,
}

impl<T: Element> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Element> Eq for Candidate<T> {}

impl<T: Element> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Element> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Per-worker buffers reused across queries.
struct Scratch<T> {
    reference_sq: Vec<T>,
    reference: Vec<f64>,
    order: Vec<(f64, u32)>,
}

impl<T: Element> Scratch<T> {
    fn new(num_pivots: usize, num_points: usize) -> Self {
        Self {
            reference_sq: vec![T::ZERO; num_pivots],
            reference: vec![0.0; num_pivots],
            order: Vec::with_capacity(num_points),
        }
    }
}

/// Query side of an [`IndexStore`]. Cheap to create; holds no mutable state.
pub struct QueryEngine<'a, T: Element> {
    index: &'a IndexStore<T>,
    /// Pivots with a non-empty distance range.
    active: Vec<usize>,
}

impl<'a, T: Element> QueryEngine<'a, T> {
    pub fn new(index: &'a IndexStore<T>) -> Self {
        let active = (0..index.num_pivots())
            .filter(|&i| !index.calibration(i).is_degenerate())
            .collect();
        Self { index, active }
    }

    /// Check `k` and the query width before any distance is computed.
    pub fn validate(&self, query_dim: usize, k: usize) -> Result<()> {
        let n = self.index.num_points();
        if k == 0 || k > n {
            return Err(QuantPivotError::InvalidParameter(format!(
                "k must be in 1..={n}, got {k}"
            )));
        }
        if query_dim != self.index.dimension() {
            return Err(QuantPivotError::DimensionMismatch {
                query_dim,
                index_dim: self.index.dimension(),
            });
        }
        Ok(())
    }

    /// k nearest neighbors of `query`, ascending by `(distance, id)`.
    pub fn search(&self, query: &[T], k: usize) -> Result<Vec<(u32, T)>> {
        self.search_with_stats(query, k).map(|(results, _)| results)
    }

    /// Like [`QueryEngine::search`], also returning work counters.
    pub fn search_with_stats(&self, query: &[T], k: usize) -> Result<(Vec<(u32, T)>, QueryStats)> {
        self.validate(query.len(), k)?;
        let padded = self.index.dataset().pad(query);
        let mut scratch = Scratch::new(self.index.num_pivots(), self.index.num_points());
        let mut ids = vec![0u32; k];
        let mut dists = vec![T::ZERO; k];
        let stats = self.search_padded(&padded, k, &mut scratch, &mut ids, &mut dists);
        Ok((ids.into_iter().zip(dists).collect(), stats))
    }

    /// Run every row of `queries`.
    ///
    /// Under [`Execution::Parallel`] queries are spread over rayon workers, each
    /// writing only its own output rows.
    pub fn search_batch(
        &self,
        queries: &Matrix<T>,
        k: usize,
        execution: Execution,
        progress: &dyn Progress,
    ) -> Result<(Neighbors<T>, QueryStats)> {
        self.validate(queries.dim(), k)?;

        let nq = queries.rows();
        let h = self.index.num_pivots();
        let n = self.index.num_points();
        let mut ids = vec![0u32; nq * k];
        let mut distances = vec![T::ZERO; nq * k];

        let stats = if execution.is_parallel() {
            let stats = ids
                .par_chunks_mut(k)
                .zip(distances.par_chunks_mut(k))
                .enumerate()
                .map_init(
                    || Scratch::new(h, n),
                    |scratch, (q, (id_row, dist_row))| {
                        self.search_padded(queries.padded_row(q), k, scratch, id_row, dist_row)
                    },
                )
                .reduce(QueryStats::default, QueryStats::merge);
            progress.report(&ProgressEvent::QueriesDone {
                done: nq,
                total: nq,
            });
            stats
        } else {
            let mut scratch = Scratch::new(h, n);
            let mut stats = QueryStats::default();
            for (q, (id_row, dist_row)) in ids
                .chunks_mut(k)
                .zip(distances.chunks_mut(k))
                .enumerate()
            {
                let s = self.search_padded(queries.padded_row(q), k, &mut scratch, id_row, dist_row);
                stats = stats.merge(s);
                progress.report(&ProgressEvent::QueriesDone {
                    done: q + 1,
                    total: nq,
                });
            }
            stats
        };

        Ok((Neighbors { ids, distances, k }, stats))
    }

    /// Core search on a lane-padded query; inputs already validated.
    fn search_padded(
        &self,
        query: &[T],
        k: usize,
        scratch: &mut Scratch<T>,
        out_ids: &mut [u32],
        out_dists: &mut [T],
    ) -> QueryStats {
        let index = self.index;
        let dataset = index.dataset();
        let n = index.num_points();

        batch_squared_distances(
            query,
            index.pivot_vectors(),
            &mut scratch.reference_sq,
            Execution::Sequential,
        );
        for (r, &sq) in scratch.reference.iter_mut().zip(&scratch.reference_sq) {
            *r = sq.sqrt().to_f64();
        }

        scratch.order.clear();
        for j in 0..n {
            let codes = index.codes_for(j);
            let mut lb = 0.0f64;
            for &i in &self.active {
                let cal = index.calibration(i);
                let r = scratch.reference[i];
                let (lo, hi) = cal.interval(codes[i]);
                let slack = T::BOUND_SLACK * (cal.max() + r);
                let bound = (r - hi).max(lo - r) - slack;
                if bound > lb {
                    lb = bound;
                }
            }
            scratch.order.push((lb, j as u32));
        }
        scratch
            .order
            .sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut heap: BinaryHeap<Candidate<T>> = BinaryHeap::with_capacity(k + 1);
        let mut worst = f64::INFINITY;
        let mut exact = 0usize;

        for &(lb, id) in &scratch.order {
            if heap.len() == k && lb > worst {
                break;
            }

            let dist = squared_distance(query, dataset.padded_row(id as usize));
            exact += 1;
            let candidate = Candidate { dist, id };

            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(mut top) = heap.peek_mut() {
                if candidate < *top {
                    *top = candidate;
                }
            }
            if heap.len() == k {
                if let Some(top) = heap.peek() {
                    worst = top.dist.sqrt().to_f64();
                }
            }
        }

        for ((slot_id, slot_dist), c) in out_ids
            .iter_mut()
            .zip(out_dists.iter_mut())
            .zip(heap.into_sorted_vec())
        {
            *slot_id = c.id;
            *slot_dist = c.dist.sqrt();
        }

        QueryStats {
            candidates: n,
            exact,
        }
    }
}

/// Exhaustive k-NN over `dataset`, ascending by `(distance, id)`.
///
/// Uses the same kernel and row layout as [`QueryEngine`], so both agree bit
/// for bit. `query.len()` must equal `dataset.dim()`.
pub fn linear_scan<T: Element>(dataset: &Matrix<T>, query: &[T], k: usize) -> Vec<(u32, T)> {
    let padded = dataset.pad(query);
    let mut all: Vec<Candidate<T>> = (0..dataset.rows())
        .map(|j| Candidate {
            dist: squared_distance(&padded, dataset.padded_row(j)),
            id: j as u32,
        })
        .collect();
    all.sort_unstable();
    all.into_iter()
        .take(k)
        .map(|c| (c.id, c.dist.sqrt()))
        .collect()
}
