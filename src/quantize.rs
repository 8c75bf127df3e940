//! Per-pivot distance calibration and integer codes.
//!
//! For pivot `i` the true distances to all points span `[min_i, max_i]`. That
//! range is cut into `x` equal buckets of width `w = (max_i - min_i) / x` and
//! each point stores the bucket index of its distance:
//!
//! ```text
//! code = clamp(floor((d - min_i) / (max_i - min_i) * x), 0, x - 1)
//! ```
//!
//! Bucket `c` covers `[min_i + c*w, min_i + (c+1)*w]`; the last bucket ends
//! exactly at `max_i`. A pivot with `max_i == min_i` is degenerate: every code
//! is 0 and the query engine ignores it.

use rayon::prelude::*;

use crate::config::Execution;
use crate::distance::batch_squared_distances;
use crate::element::Element;
use crate::matrix::Matrix;
use crate::progress::{Progress, ProgressEvent};

/// Observed distance range of one pivot, plus its bucket count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    min: f64,
    max: f64,
    levels: u32,
}

impl Calibration {
    /// `levels` must be at least 1.
    pub fn new(min: f64, max: f64, levels: u32) -> Self {
        debug_assert!(levels >= 1);
        debug_assert!(min <= max);
        Self { min, max, levels }
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// All points are at the same distance from this pivot.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Bucket width.
    #[inline]
    pub fn width(&self) -> f64 {
        (self.max - self.min) / f64::from(self.levels)
    }

    /// Bucket index of a true distance.
    pub fn encode(&self, d: f64) -> u32 {
        if self.is_degenerate() {
            return 0;
        }
        let t = (d - self.min) / (self.max - self.min);
        let scaled = (t * f64::from(self.levels)).floor();
        // NaN fails both comparisons and lands in bucket 0.
        if scaled >= f64::from(self.levels - 1) {
            self.levels - 1
        } else if scaled > 0.0 {
            scaled as u32
        } else {
            0
        }
    }

    /// Distance range represented by `code`, inclusive at both ends.
    #[inline]
    pub fn interval(&self, code: u32) -> (f64, f64) {
        let w = self.width();
        let lo = self.min + f64::from(code) * w;
        let hi = if code + 1 >= self.levels {
            self.max
        } else {
            self.min + f64::from(code + 1) * w
        };
        (lo, hi)
    }
}

/// Calibration and code matrix produced by [`quantize`].
#[derive(Debug, Clone)]
pub struct Quantized {
    pub calibrations: Vec<Calibration>,
    /// Row-major `N x h`.
    pub codes: Vec<u32>,
}

/// Calibrate every pivot and encode every point.
///
/// `pivot_vectors` holds the pivot rows (same stride as `dataset`).
pub fn quantize<T: Element>(
    dataset: &Matrix<T>,
    pivot_vectors: &Matrix<T>,
    levels: u32,
    execution: Execution,
    progress: &dyn Progress,
) -> Quantized {
    let n = dataset.rows();
    let h = pivot_vectors.rows();

    let mut calibrations = Vec::with_capacity(h);
    let mut codes = vec![0u32; n * h];
    let mut column = vec![T::ZERO; n];
    let mut degenerate = 0usize;

    for i in 0..h {
        batch_squared_distances(pivot_vectors.padded_row(i), dataset, &mut column, execution);

        let (min, max) = column
            .iter()
            .map(|&sq| sq.sqrt().to_f64())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });
        let calibration = Calibration::new(min, max, levels);
        calibrations.push(calibration);

        if calibration.is_degenerate() {
            degenerate += 1;
            progress.report(&ProgressEvent::DegeneratePivot {
                pivot: i,
                distance: min,
            });
            // Codes are already 0.
            continue;
        }

        let encode = |row: &mut [u32], sq: &T| {
            row[i] = calibration.encode(sq.sqrt().to_f64());
        };
        if execution.is_parallel() {
            codes
                .par_chunks_mut(h)
                .zip(column.par_iter())
                .for_each(|(row, sq)| encode(row, sq));
        } else {
            codes
                .chunks_mut(h)
                .zip(column.iter())
                .for_each(|(row, sq)| encode(row, sq));
        }
    }

    progress.report(&ProgressEvent::CalibrationDone { degenerate });

    Quantized {
        calibrations,
        codes,
    }
}
