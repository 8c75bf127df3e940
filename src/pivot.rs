//! Farthest-point pivot selection.
//!
//! Pivot 0 is point 0. Each further pivot is the not-yet-chosen point whose
//! distance to its closest chosen pivot is largest (lowest index on ties).
//! Spreading the pivots this way keeps the triangle-inequality bounds from
//! different pivots from being redundant.
//!
//! # References
//!
//! - Gonzalez (1985): "Clustering to minimize the maximum intercluster distance"

use crate::config::Execution;
use crate::distance::batch_squared_distances;
use crate::element::Element;
use crate::error::{QuantPivotError, Result};
use crate::matrix::Matrix;

/// Choose `h` distinct pivot ids from `dataset`.
pub fn select_pivots<T: Element>(
    dataset: &Matrix<T>,
    h: usize,
    execution: Execution,
) -> Result<Vec<usize>> {
    let n = dataset.rows();
    if h == 0 || h > n {
        return Err(QuantPivotError::InvalidParameter(format!(
            "h (pivots) must be in 1..={n}, got {h}"
        )));
    }

    let mut pivots = Vec::with_capacity(h);
    let mut chosen = vec![false; n];
    // Squared distance from each point to its nearest chosen pivot.
    let mut min_dist: Vec<T> = Vec::new();
    let mut scratch = vec![T::ZERO; n];

    let mut next = 0usize;
    loop {
        pivots.push(next);
        chosen[next] = true;
        if pivots.len() == h {
            break;
        }

        batch_squared_distances(dataset.padded_row(next), dataset, &mut scratch, execution);
        if min_dist.is_empty() {
            min_dist.extend_from_slice(&scratch);
        } else {
            for (m, &d) in min_dist.iter_mut().zip(&scratch) {
                if d.total_cmp(m).is_lt() {
                    *m = d;
                }
            }
        }

        // Strict comparison keeps the lowest index on ties.
        let mut best: Option<(usize, T)> = None;
        for (j, &d) in min_dist.iter().enumerate() {
            if chosen[j] {
                continue;
            }
            match best {
                Some((_, best_d)) if !d.total_cmp(&best_d).is_gt() => {}
                _ => best = Some((j, d)),
            }
        }
        // h <= n guarantees an unchosen point remains.
        next = match best {
            Some((j, _)) => j,
            None => break,
        };
    }

    Ok(pivots)
}
