//! Euclidean distance kernel: single, final-result, and batch forms.
//!
//! Rankings are done on squared distances; the square root is only applied to
//! values that leave the engine or feed the pivot bounds.

use rayon::prelude::*;

use crate::config::Execution;
use crate::element::Element;
use crate::matrix::Matrix;

/// Rows per rayon task in the parallel batch form.
const BATCH_CHUNK: usize = 256;

/// Squared Euclidean distance.
#[inline]
#[must_use]
pub fn squared_distance<T: Element>(a: &[T], b: &[T]) -> T {
    T::l2_distance_squared(a, b)
}

/// Euclidean distance (square root applied).
#[inline]
#[must_use]
pub fn distance<T: Element>(a: &[T], b: &[T]) -> T {
    squared_distance(a, b).sqrt()
}

/// Squared distances from `reference` to every row of `matrix`, written to `out`.
///
/// `reference` must be lane-padded to the matrix stride. Under
/// [`Execution::Parallel`] the output is split into disjoint chunks, each
/// filled by one rayon task from its own row range.
pub fn batch_squared_distances<T: Element>(
    reference: &[T],
    matrix: &Matrix<T>,
    out: &mut [T],
    execution: Execution,
) {
    debug_assert_eq!(out.len(), matrix.rows());

    if execution.is_parallel() {
        out.par_chunks_mut(BATCH_CHUNK)
            .enumerate()
            .for_each(|(chunk, slots)| {
                let start = chunk * BATCH_CHUNK;
                for (offset, slot) in slots.iter_mut().enumerate() {
                    *slot = squared_distance(reference, matrix.padded_row(start + offset));
                }
            });
    } else {
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = squared_distance(reference, matrix.padded_row(row));
        }
    }
}
