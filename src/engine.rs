//! `fit` / `predict` entry points.
//!
//! [`QuantPivot`] owns the execution strategy (and, for the parallel variant, a
//! dedicated rayon pool) and the current [`IndexStore`]. `fit` always builds a
//! fresh store and swaps it in; an existing store is never modified, so any
//! `Arc` handed out by [`QuantPivot::index`] stays valid and unchanged.
//!
//! # Usage
//!
//! ```rust
//! use quantpivot::{Matrix, QuantPivot};
//!
//! # fn main() -> quantpivot::Result<()> {
//! let dataset = Matrix::<f64>::from_rows(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]])?;
//! let queries = Matrix::<f64>::from_rows(&[[1.0, 1.0]])?;
//!
//! let mut engine = QuantPivot::sequential();
//! engine.fit(dataset, 1, 4, true)?;
//! let neighbors = engine.predict(&queries, 2, true)?;
//!
//! assert_eq!(neighbors.ids_row(0), &[0, 1]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::{Execution, FitParams, Variant};
use crate::element::Element;
use crate::error::{QuantPivotError, Result};
use crate::index::IndexStore;
use crate::matrix::Matrix;
use crate::progress::{reporter, Progress, ProgressEvent};
use crate::search::{Neighbors, QueryEngine};

/// Exact k-NN engine generic over element precision.
pub struct QuantPivot<T: Element> {
    execution: Execution,
    pool: Option<rayon::ThreadPool>,
    index: Option<Arc<IndexStore<T>>>,
}

impl<T: Element> QuantPivot<T> {
    /// Engine with the given execution strategy.
    pub fn new(execution: Execution) -> Result<Self> {
        Ok(Self {
            execution,
            pool: execution.build_pool()?,
            index: None,
        })
    }

    /// Sequential engine (never fails: no pool is needed).
    pub fn sequential() -> Self {
        Self {
            execution: Execution::Sequential,
            pool: None,
            index: None,
        }
    }

    /// Engine for one of the named variants; `T` must match its precision.
    pub fn for_variant(variant: Variant, threads: usize) -> Result<Self> {
        let bits = (T::BYTES * 8) as u32;
        if bits != variant.bits() {
            return Err(QuantPivotError::InvalidParameter(format!(
                "variant {variant} needs {}-bit elements, got {}",
                variant.bits(),
                T::NAME
            )));
        }
        Self::new(variant.execution(threads))
    }

    #[inline]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Current index, if `fit` has succeeded at least once.
    #[inline]
    pub fn index(&self) -> Option<&Arc<IndexStore<T>>> {
        self.index.as_ref()
    }

    /// Build an index over `dataset` with `h` pivots and `x` levels.
    ///
    /// `silent` only chooses the progress reporter.
    pub fn fit(&mut self, dataset: Matrix<T>, h: usize, x: usize, silent: bool) -> Result<()> {
        self.fit_with(dataset, &FitParams::new(h, x), reporter(silent))
    }

    /// [`QuantPivot::fit`] with explicit parameters and reporter.
    ///
    /// On error the previous index, if any, is kept.
    pub fn fit_with(
        &mut self,
        dataset: Matrix<T>,
        params: &FitParams,
        progress: &dyn Progress,
    ) -> Result<()> {
        params.validate(dataset.rows())?;
        let execution = self.execution;
        let index = self.run(|| IndexStore::build(dataset, params, execution, progress))?;
        self.index = Some(Arc::new(index));
        Ok(())
    }

    /// k nearest neighbors of every row of `queries`.
    pub fn predict(&self, queries: &Matrix<T>, k: usize, silent: bool) -> Result<Neighbors<T>> {
        self.predict_with(queries, k, reporter(silent))
    }

    /// [`QuantPivot::predict`] with an explicit reporter.
    pub fn predict_with(
        &self,
        queries: &Matrix<T>,
        k: usize,
        progress: &dyn Progress,
    ) -> Result<Neighbors<T>> {
        let index = self.index.as_ref().ok_or(QuantPivotError::NotFitted)?;
        let engine = QueryEngine::new(index);
        engine.validate(queries.dim(), k)?;

        progress.report(&ProgressEvent::PredictStarted {
            queries: queries.rows(),
            k,
        });

        let execution = self.execution;
        let (neighbors, stats) =
            self.run(|| engine.search_batch(queries, k, execution, progress))?;

        progress.report(&ProgressEvent::PredictFinished {
            queries: queries.rows(),
            exact_distances: stats.exact,
            candidates: stats.candidates,
        });
        Ok(neighbors)
    }

    /// Run `f` inside the dedicated pool, if there is one.
    fn run<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}
