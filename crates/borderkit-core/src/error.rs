//! Error types for borderkit-core

use thiserror::Error;

/// Errors raised by the dense kernels of this crate
#[derive(Debug, Error)]
pub enum CoreError {
    /// Vector or matrix length does not match the expected dimension
    #[error("Dimension mismatch: expected length {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A square matrix was required
    #[error("Matrix is not square: {nrows}x{ncols}")]
    NotSquare {
        /// Number of rows
        nrows: usize,
        /// Number of columns
        ncols: usize,
    },

    /// Factorisation hit a pivot indistinguishable from zero
    #[error("Singular matrix encountered during factorization")]
    SingularMatrix,

    /// NaN values encountered
    #[error("NaN values encountered in {what}")]
    NaNEncountered {
        /// Name of the quantity where NaN was encountered
        what: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },
}

/// Result type for borderkit-core operations
pub type Result<T> = std::result::Result<T, CoreError>;
