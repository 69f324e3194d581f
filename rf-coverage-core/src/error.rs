//! Error types shared across the coverage engine.

use thiserror::Error;

/// Result alias used throughout `rf-coverage-core`.
pub type CoverageResult<T> = Result<T, CoverageError>;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid budget: {0}")]
    InvalidBudget(String),

    #[error("numeric failure: {0}")]
    NumericFailure(String),

    #[error("simulation cancelled")]
    Cancelled,
}
