//! Error types for the bordered solvers

use borderkit_core::CoreError;
use thiserror::Error;

/// Errors raised by the bordered-solver family.
///
/// Non-convergence of an inner solve is deliberately absent: it is reported
/// through the `converged` flag on result structs so the outer loop can
/// decide what to do with a partial result.
#[derive(Debug, Error)]
pub enum BorderedError {
    /// Invalid construction parameters; fatal at configuration time
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the offending parameter
        message: String,
    },

    /// Inconsistent dimensions between the operator, borders and right-hand
    /// sides; a programmer error
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input is inconsistent
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Failure inside a dense kernel (factorisation, GMRES breakdown)
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for bordered-solver operations
pub type Result<T> = std::result::Result<T, BorderedError>;
