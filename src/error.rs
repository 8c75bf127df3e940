//! Error types for quantpivot.

use thiserror::Error;

/// Errors that can occur while building, querying, or loading an index.
#[derive(Debug, Error)]
pub enum QuantPivotError {
    /// Invalid parameter value (h, x, k, or matrix shape).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between a query and the indexed dataset.
    #[error("dimension mismatch: query has {query_dim} dimensions, index has {index_dim}")]
    DimensionMismatch { query_dim: usize, index_dim: usize },

    /// `predict` was called before any successful `fit`.
    #[error("index not fitted")]
    NotFitted,

    /// The worker pool for the multi-threaded variant could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// I/O error while reading or writing a dataset container.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated dataset container.
    #[error("format error: {0}")]
    Format(String),
}

impl QuantPivotError {
    /// True for errors raised by parameter validation, before any computation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_) | Self::DimensionMismatch { .. } | Self::NotFitted
        )
    }
}

impl From<rayon::ThreadPoolBuildError> for QuantPivotError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuantPivotError>;
