//! Adapter-local error type, wrapping the core's error for the parts of this crate that
//! delegate validation to it.

use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Coverage(#[from] rf_coverage_core::error::CoverageError),

    #[error("failed to parse floor plan: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to write result: {0}")]
    Io(#[from] std::io::Error),
}
