//! quantpivot: exact k-nearest-neighbor search with a pivot-based, quantized
//! lower-bound index.
//!
//! `fit` picks `h` pivots by farthest-point sampling, calibrates the range of
//! point-to-pivot distances per pivot, and stores every distance as one of `x`
//! bucket codes. `predict` turns those codes into triangle-inequality lower
//! bounds, visits points best-bound-first, and stops once no remaining bound
//! can beat the current k-th exact distance.
//!
//! The index is lossless with respect to the answer: `h` and `x` change how
//! many exact distances are computed, never which neighbors come back.
//!
//! | Module | Role |
//! |--------|------|
//! | [`simd`] / [`distance`] | Squared L2 kernels (SSE `f32`, AVX `f64`) and batch form |
//! | [`pivot`] | Farthest-point pivot selection |
//! | [`quantize`] | Per-pivot calibration and codes |
//! | [`index`] | Immutable [`IndexStore`] |
//! | [`search`] | Bound-pruned [`QueryEngine`] |
//! | [`engine`] | [`QuantPivot`] `fit` / `predict` |
//! | [`container`] | Binary dataset container I/O |
//!
//! # Variants
//!
//! | Variant | Element | SIMD | Threads |
//! |---------|---------|------|---------|
//! | `32` | `f32` | 4-wide SSE | 1 |
//! | `64` | `f64` | 4-wide AVX | 1 |
//! | `64omp` | `f64` | 4-wide AVX | rayon pool |
//!
//! # When Pruning Helps
//!
//! Bounds are tight when the pivots are spread out and the data has low
//! intrinsic dimensionality. In high dimensions pairwise distances
//! concentrate, bounds flatten, and the scan degrades gracefully toward a
//! linear pass, still exact.

pub mod config;
pub mod container;
pub mod distance;
pub mod element;
pub mod engine;
pub mod error;
pub mod index;
pub mod matrix;
pub mod pivot;
pub mod progress;
pub mod quantize;
pub mod search;
pub mod simd;

pub use config::{Execution, FitParams, Variant};
pub use element::Element;
pub use engine::QuantPivot;
pub use error::{QuantPivotError, Result};
pub use index::IndexStore;
pub use matrix::Matrix;
pub use progress::{Progress, ProgressEvent, SilentProgress, TracingProgress};
pub use quantize::Calibration;
pub use search::{Neighbors, QueryEngine, QueryStats};
