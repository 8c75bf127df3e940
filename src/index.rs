//! Immutable pivot index.
//!
//! An [`IndexStore`] owns the dataset, the pivot ids and vectors, one
//! [`Calibration`] per pivot, and the `N x h` code matrix. Nothing can change
//! after [`IndexStore::build`] returns; rebuilding means building a new store.

use crate::config::{Execution, FitParams};
use crate::element::Element;
use crate::error::Result;
use crate::matrix::Matrix;
use crate::pivot::select_pivots;
use crate::progress::{Progress, ProgressEvent};
use crate::quantize::{quantize, Calibration};

/// Read-only index built by `fit`.
#[derive(Debug, Clone)]
pub struct IndexStore<T: Element> {
    dataset: Matrix<T>,
    pivots: Vec<usize>,
    pivot_vectors: Matrix<T>,
    calibrations: Vec<Calibration>,
    codes: Vec<u32>,
    levels: usize,
    execution: Execution,
}

impl<T: Element> IndexStore<T> {
    /// Validate parameters, select pivots, calibrate, and encode.
    ///
    /// Runs on the calling thread's rayon pool when `execution` is parallel.
    pub fn build(
        dataset: Matrix<T>,
        params: &FitParams,
        execution: Execution,
        progress: &dyn Progress,
    ) -> Result<Self> {
        params.validate(dataset.rows())?;
        // Checked by validate.
        let levels = params.levels as u32;

        progress.report(&ProgressEvent::FitStarted {
            num_points: dataset.rows(),
            dimension: dataset.dim(),
            pivots: params.pivots,
            levels: params.levels,
        });

        let pivots = select_pivots(&dataset, params.pivots, execution)?;
        progress.report(&ProgressEvent::PivotsSelected { pivots: &pivots });

        let pivot_vectors = dataset.select(&pivots);
        let quantized = quantize(&dataset, &pivot_vectors, levels, execution, progress);

        progress.report(&ProgressEvent::FitFinished);

        Ok(Self {
            dataset,
            pivots,
            pivot_vectors,
            calibrations: quantized.calibrations,
            codes: quantized.codes,
            levels: params.levels,
            execution,
        })
    }

    /// Dataset vector by id.
    #[inline]
    pub fn vector(&self, id: usize) -> &[T] {
        self.dataset.row(id)
    }

    #[inline]
    pub fn dataset(&self) -> &Matrix<T> {
        &self.dataset
    }

    /// Dataset ids of the pivots, in selection order.
    #[inline]
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    #[inline]
    pub fn pivot_vectors(&self) -> &Matrix<T> {
        &self.pivot_vectors
    }

    #[inline]
    pub fn pivot_vector(&self, pivot: usize) -> &[T] {
        self.pivot_vectors.row(pivot)
    }

    #[inline]
    pub fn calibration(&self, pivot: usize) -> &Calibration {
        &self.calibrations[pivot]
    }

    #[inline]
    pub fn calibrations(&self) -> &[Calibration] {
        &self.calibrations
    }

    /// Code of `point` at `pivot`.
    #[inline]
    pub fn code(&self, point: usize, pivot: usize) -> u32 {
        self.codes[point * self.pivots.len() + pivot]
    }

    /// All `h` codes of one point.
    #[inline]
    pub fn codes_for(&self, point: usize) -> &[u32] {
        let h = self.pivots.len();
        &self.codes[point * h..(point + 1) * h]
    }

    /// Positions (in pivot order) of degenerate pivots.
    pub fn degenerate_pivots(&self) -> Vec<usize> {
        self.calibrations
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_degenerate())
            .map(|(i, _)| i)
            .collect()
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.dataset.rows()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dataset.dim()
    }

    #[inline]
    pub fn num_pivots(&self) -> usize {
        self.pivots.len()
    }

    /// Quantization levels (`x`).
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    #[inline]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Approximate heap size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.dataset.size_bytes()
            + self.pivot_vectors.size_bytes()
            + self.pivots.len() * std::mem::size_of::<usize>()
            + self.calibrations.len() * std::mem::size_of::<Calibration>()
            + self.codes.len() * std::mem::size_of::<u32>()
    }
}
