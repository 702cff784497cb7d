//! Error types for structure-preserving conversions

use thiserror::Error;

/// Main error type for conversion operations
#[derive(Error, Debug)]
pub enum Error {
    /// A scalar was requested from a leaf that does not hold exactly one element
    #[error("Scalar extraction error: expected exactly one element, got {0}")]
    ScalarExtraction(usize),

    /// No accelerator device could be resolved
    #[error("Accelerator unavailable: {0}")]
    AcceleratorUnavailable(String),

    /// Tensor operation error
    #[error("Tensor operation error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Array shape error
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a scalar extraction error carrying the offending element count
    pub fn scalar_extraction(elements: usize) -> Self {
        Self::ScalarExtraction(elements)
    }

    /// Create an accelerator unavailability error
    pub fn accelerator_unavailable(msg: impl Into<String>) -> Self {
        Self::AcceleratorUnavailable(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
