//! Build parameters, execution strategy, and variant selection.

use std::fmt;
use std::str::FromStr;

use crate::error::{QuantPivotError, Result};

/// Parameters for [`crate::IndexStore::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FitParams {
    /// Number of pivots (`h`).
    pub pivots: usize,

    /// Number of quantization levels per pivot (`x`).
    pub levels: usize,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            pivots: 8,
            levels: 16,
        }
    }
}

impl FitParams {
    pub fn new(pivots: usize, levels: usize) -> Self {
        Self { pivots, levels }
    }

    /// Check the parameters against a dataset of `num_points` rows.
    pub fn validate(&self, num_points: usize) -> Result<()> {
        if num_points == 0 {
            return Err(QuantPivotError::InvalidParameter(
                "dataset is empty".to_string(),
            ));
        }
        if self.pivots == 0 {
            return Err(QuantPivotError::InvalidParameter(
                "h (pivots) must be at least 1".to_string(),
            ));
        }
        if self.pivots > num_points {
            return Err(QuantPivotError::InvalidParameter(format!(
                "h (pivots) = {} exceeds dataset size {num_points}",
                self.pivots
            )));
        }
        if self.levels == 0 {
            return Err(QuantPivotError::InvalidParameter(
                "x (levels) must be at least 1".to_string(),
            ));
        }
        if u32::try_from(self.levels).is_err() {
            return Err(QuantPivotError::InvalidParameter(format!(
                "x (levels) = {} does not fit a 32-bit code",
                self.levels
            )));
        }
        Ok(())
    }
}

/// How batch passes and the per-query loop are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    /// Single thread, SIMD only.
    #[default]
    Sequential,
    /// rayon worker pool; `threads == 0` uses rayon's default size.
    Parallel { threads: usize },
}

impl Execution {
    #[inline]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Execution::Parallel { .. })
    }

    /// Dedicated worker pool for the parallel strategy.
    pub(crate) fn build_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        match *self {
            Execution::Sequential => Ok(None),
            Execution::Parallel { threads } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("quantpivot-{i}"))
                    .build()?;
                Ok(Some(pool))
            }
        }
    }
}

/// The three named engine configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// `f32`, 4-wide SSE, sequential ("32").
    Single,
    /// `f64`, 4-wide AVX, sequential ("64").
    Double,
    /// `f64`, 4-wide AVX, multi-threaded ("64omp").
    DoubleParallel,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Single, Variant::Double, Variant::DoubleParallel];

    /// Bits per element.
    pub fn bits(&self) -> u32 {
        match self {
            Variant::Single => 32,
            Variant::Double | Variant::DoubleParallel => 64,
        }
    }

    /// Execution strategy; `threads` only matters for the parallel variant.
    pub fn execution(&self, threads: usize) -> Execution {
        match self {
            Variant::Single | Variant::Double => Execution::Sequential,
            Variant::DoubleParallel => Execution::Parallel { threads },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Single => "32",
            Variant::Double => "64",
            Variant::DoubleParallel => "64omp",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = QuantPivotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "32" => Ok(Variant::Single),
            "64" => Ok(Variant::Double),
            "64omp" => Ok(Variant::DoubleParallel),
            other => Err(QuantPivotError::InvalidParameter(format!(
                "unknown variant '{other}', expected one of 32, 64, 64omp"
            ))),
        }
    }
}
