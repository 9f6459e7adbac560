//! Numerical foundation for the borderkit solvers.
//!
//! This crate carries the pieces the bordered-solver family is built from:
//! a scalar abstraction over real and complex floats, dense matrix helpers
//! on `mdarray`, composite vectors with a uniform vector-space contract,
//! a partial-pivoting LU factorisation, and a restarted GMRES that runs on
//! any vector representation.

// Scalars and errors
pub mod error;
pub mod scalar;

pub use error::{CoreError, Result};
pub use scalar::Scalar;

// Dense storage and vectors
pub mod dense;
pub mod vector;

pub use dense::{adjoint, eye, from_vec2d, matmul, matvec, ncols, nrows, zeros, Matrix};
pub use vector::{axpy, dot, euclidean, norm2, BorderedVec, VectorSpace};

// Solvers
pub mod gmres;
pub mod lu;

pub use gmres::{gmres, GmresOptions, GmresOutcome};
pub use lu::PartialPivLu;
