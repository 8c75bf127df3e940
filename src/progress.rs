//! Progress reporting for `fit` and `predict`.
//!
//! The engine never prints. It hands [`ProgressEvent`]s to an injected
//! [`Progress`] implementation; the `silent` flag of the orchestrator only picks
//! which implementation is used.

use tracing::{debug, info, warn};

/// Milestones emitted while building or querying an index.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent<'a> {
    FitStarted {
        num_points: usize,
        dimension: usize,
        pivots: usize,
        levels: usize,
    },
    PivotsSelected {
        pivots: &'a [usize],
    },
    /// A pivot whose distances to every point are identical.
    DegeneratePivot {
        pivot: usize,
        distance: f64,
    },
    CalibrationDone {
        degenerate: usize,
    },
    FitFinished,
    PredictStarted {
        queries: usize,
        k: usize,
    },
    /// Emitted per query by the sequential path, once per batch by the parallel one.
    QueriesDone {
        done: usize,
        total: usize,
    },
    PredictFinished {
        queries: usize,
        exact_distances: usize,
        candidates: usize,
    },
}

/// Sink for progress events.
pub trait Progress: Send + Sync {
    fn report(&self, event: &ProgressEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    #[inline]
    fn report(&self, _event: &ProgressEvent<'_>) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn report(&self, event: &ProgressEvent<'_>) {
        match *event {
            ProgressEvent::FitStarted {
                num_points,
                dimension,
                pivots,
                levels,
            } => info!(num_points, dimension, pivots, levels, "fit: building index"),
            ProgressEvent::PivotsSelected { pivots } => {
                info!(count = pivots.len(), "fit: pivots selected");
                debug!(?pivots, "fit: pivot ids");
            }
            ProgressEvent::DegeneratePivot { pivot, distance } => {
                warn!(pivot, distance, "fit: degenerate pivot, no pruning power")
            }
            ProgressEvent::CalibrationDone { degenerate } => {
                info!(degenerate, "fit: calibration and codes done")
            }
            ProgressEvent::FitFinished => info!("fit: completed"),
            ProgressEvent::PredictStarted { queries, k } => {
                info!(queries, k, "predict: searching")
            }
            ProgressEvent::QueriesDone { done, total } => {
                if done == total || done == 1 || done % 100 == 0 {
                    debug!(done, total, "predict: progress");
                }
            }
            ProgressEvent::PredictFinished {
                queries,
                exact_distances,
                candidates,
            } => {
                let scanned = if candidates == 0 {
                    0.0
                } else {
                    exact_distances as f64 / candidates as f64
                };
                info!(
                    queries,
                    exact_distances,
                    scanned_fraction = scanned,
                    "predict: completed"
                );
            }
        }
    }
}

/// Pick the reporter for a `silent` flag.
pub fn reporter(silent: bool) -> &'static dyn Progress {
    if silent {
        &SilentProgress
    } else {
        &TracingProgress
    }
}
