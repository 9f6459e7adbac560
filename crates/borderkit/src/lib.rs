//! Bordered linear solvers for numerical continuation.
//!
//! Pseudo-arclength continuation, fold and Hopf detection, shooting
//! problems and deflation all end up solving the same shape of system: a
//! square operator `J` augmented by a handful of border rows and columns,
//!
//! ```text
//! (shift I + J) u + a v = r
//!        b u   +   c v  = s
//! ```
//!
//! with `J` often available only through a linear solver or an operator
//! application. Three interchangeable back-ends expose one contract:
//!
//! - [`BorderingBls`] eliminates the border through solves with `J` alone,
//!   with optional residual-driven corrections;
//! - [`MatrixBls`] assembles the enlarged matrix and solves it densely;
//! - [`MatrixFreeBls`] wraps the enlarged operator and hands it to an
//!   iterative solver.
//!
//! [`LsFromBls`] goes the other way and exposes a plain linear solver
//! whose implementation partitions its matrix and eliminates the border.

// Errors
pub mod error;
pub use error::{BorderedError, Result};

// Inner linear-solver contracts and back-ends
pub mod linear;
pub use linear::{
    CachedLuSolver, ClosureOp, DenseLuSolver, FactorizedOp, GmresLinearSolver,
    LinearOp, LinearSolver, MatrixFreeSolver, MultiSolveOutcome, OpSolveOutcome, SolveOutcome,
};

// The bordered-system description and the solver family
pub mod bordered;
pub mod bordering;
pub mod matrix;
pub mod matrix_free;

pub use bordered::{
    apply_bordered, residual, Bordered, BorderScaling, BorderedSolution, BorderedSolver,
};
pub use bordering::BorderingBls;
pub use matrix::{assemble, MatrixBls};
pub use matrix_free::MatrixFreeBls;

// BLS-as-linear-solver and the continuation adapter
pub mod continuation;
pub mod ls_from_bls;

pub use continuation::{solve_arclength, ArclengthWeight, Tangent};
pub use ls_from_bls::LsFromBls;

// Re-export the numerical foundation
pub use borderkit_core;
pub use borderkit_core::{
    euclidean, gmres, BorderedVec, GmresOptions, GmresOutcome, Matrix, PartialPivLu, Scalar,
    VectorSpace,
};
