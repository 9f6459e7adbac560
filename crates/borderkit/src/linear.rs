//! Inner linear-solver contracts and the back-ends shipped with them.
//!
//! The bordered solvers never factorise or iterate on the square operator
//! `J` themselves; they consume it through the small capability surface
//! below. Dense, factorisation-caching and matrix-free back-ends are
//! provided; anything else that implements the traits plugs in the same
//! way.

use borderkit_core::dense::{nrows, Matrix};
use borderkit_core::gmres::{gmres, GmresOptions};
use borderkit_core::lu::PartialPivLu;
use borderkit_core::scalar::Scalar;
use borderkit_core::vector::{axpy, VectorSpace};

use crate::error::Result;

/// A square linear operator acting on coefficient slices.
pub trait LinearOp<T: Scalar> {
    /// Dimension of the (square) operator.
    fn dim(&self) -> usize;

    /// Apply the operator: `J * x`.
    fn apply(&self, x: &[T]) -> Vec<T>;

    /// Apply the shifted operator: `(shift * I + J) * x`.
    fn apply_shifted(&self, x: &[T], shift: Option<T>) -> Vec<T> {
        let mut out = self.apply(x);
        if let Some(sigma) = shift {
            axpy(sigma, x, &mut out);
        }
        out
    }
}

impl<T: Scalar> LinearOp<T> for Matrix<T> {
    fn dim(&self) -> usize {
        nrows(self)
    }

    fn apply(&self, x: &[T]) -> Vec<T> {
        borderkit_core::dense::matvec(self, x)
    }
}

/// Copy of a matrix with `shift * I` added to the diagonal.
pub(crate) fn shifted_matrix<T: Scalar>(a: &Matrix<T>, shift: Option<T>) -> Matrix<T> {
    let mut m = a.clone();
    if let Some(sigma) = shift {
        for i in 0..nrows(a) {
            let old = m[[i, i]];
            m[[i, i]] = old + sigma;
        }
    }
    m
}

/// Result of a single linear solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome<T> {
    /// The solution vector.
    pub solution: Vec<T>,

    /// Whether the solver converged.
    pub converged: bool,

    /// Number of iterations performed (1 for a direct solve).
    pub iterations: usize,
}

/// Result of a multi right-hand-side solve against one operator.
#[derive(Debug, Clone)]
pub struct MultiSolveOutcome<T> {
    /// One solution per right-hand side, in input order.
    pub solutions: Vec<Vec<T>>,

    /// AND of the per-solve convergence flags.
    pub converged: bool,

    /// Iteration count of each solve, in input order.
    pub iterations: Vec<usize>,
}

/// A linear solver for the square operator `J`.
///
/// Two call shapes are required: a plain solve of `J x = r`, and a shifted
/// multi right-hand-side solve of `(shift I + J) x_i = r_i` that reuses one
/// factorisation across the right-hand sides when the back-end has one.
pub trait LinearSolver<T: Scalar, Op: LinearOp<T>> {
    /// Solve `J x = rhs`.
    fn solve(&self, op: &Op, rhs: &[T]) -> Result<SolveOutcome<T>>;

    /// Solve `(shift I + J) x_i = rhs_i` for every right-hand side.
    ///
    /// `shift = None` means no shift.
    fn solve_shifted(&self, op: &Op, rhss: &[&[T]], shift: Option<T>)
        -> Result<MultiSolveOutcome<T>>;
}

/// Direct solver for stored matrices: factorise once per call, solve every
/// right-hand side against the factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLuSolver;

impl<T: Scalar> LinearSolver<T, Matrix<T>> for DenseLuSolver {
    fn solve(&self, op: &Matrix<T>, rhs: &[T]) -> Result<SolveOutcome<T>> {
        let lu = PartialPivLu::new(op)?;
        Ok(SolveOutcome {
            solution: lu.solve(rhs)?,
            converged: true,
            iterations: 1,
        })
    }

    fn solve_shifted(
        &self,
        op: &Matrix<T>,
        rhss: &[&[T]],
        shift: Option<T>,
    ) -> Result<MultiSolveOutcome<T>> {
        let lu = PartialPivLu::new(&shifted_matrix(op, shift))?;
        let mut solutions = Vec::with_capacity(rhss.len());
        for rhs in rhss {
            solutions.push(lu.solve(rhs)?);
        }
        Ok(MultiSolveOutcome {
            converged: true,
            iterations: vec![1; rhss.len()],
            solutions,
        })
    }
}

/// A matrix bundled with its LU factorisation.
///
/// Lets hot loops (continuation, [`crate::LsFromBls`]) factorise once and
/// keep both the operator application and the cheap solves.
#[derive(Debug, Clone)]
pub struct FactorizedOp<T: Scalar> {
    matrix: Matrix<T>,
    lu: PartialPivLu<T>,
}

impl<T: Scalar> FactorizedOp<T> {
    /// Factorise the matrix up front.
    pub fn new(matrix: Matrix<T>) -> Result<Self> {
        let lu = PartialPivLu::new(&matrix)?;
        Ok(Self { matrix, lu })
    }

    /// The stored matrix.
    pub fn matrix(&self) -> &Matrix<T> {
        &self.matrix
    }

    /// The stored factorisation.
    pub fn factors(&self) -> &PartialPivLu<T> {
        &self.lu
    }
}

impl<T: Scalar> LinearOp<T> for FactorizedOp<T> {
    fn dim(&self) -> usize {
        nrows(&self.matrix)
    }

    fn apply(&self, x: &[T]) -> Vec<T> {
        borderkit_core::dense::matvec(&self.matrix, x)
    }
}

/// Solver that reuses the factorisation carried by a [`FactorizedOp`].
///
/// Unshifted solves go straight to the stored factors; a shifted solve has
/// to refactorise the shifted matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedLuSolver;

impl<T: Scalar> LinearSolver<T, FactorizedOp<T>> for CachedLuSolver {
    fn solve(&self, op: &FactorizedOp<T>, rhs: &[T]) -> Result<SolveOutcome<T>> {
        Ok(SolveOutcome {
            solution: op.factors().solve(rhs)?,
            converged: true,
            iterations: 1,
        })
    }

    fn solve_shifted(
        &self,
        op: &FactorizedOp<T>,
        rhss: &[&[T]],
        shift: Option<T>,
    ) -> Result<MultiSolveOutcome<T>> {
        let fresh;
        let lu = match shift {
            None => op.factors(),
            Some(_) => {
                fresh = PartialPivLu::new(&shifted_matrix(op.matrix(), shift))?;
                &fresh
            }
        };
        let mut solutions = Vec::with_capacity(rhss.len());
        for rhs in rhss {
            solutions.push(lu.solve(rhs)?);
        }
        Ok(MultiSolveOutcome {
            converged: true,
            iterations: vec![1; rhss.len()],
            solutions,
        })
    }
}

/// Iterative back-end: GMRES against the operator application alone.
#[derive(Debug, Clone, Default)]
pub struct GmresLinearSolver {
    /// Options forwarded to every GMRES invocation.
    pub options: GmresOptions,
}

impl GmresLinearSolver {
    /// Solver with the given GMRES options.
    pub fn new(options: GmresOptions) -> Self {
        Self { options }
    }
}

impl<T: Scalar, Op: LinearOp<T>> LinearSolver<T, Op> for GmresLinearSolver {
    fn solve(&self, op: &Op, rhs: &[T]) -> Result<SolveOutcome<T>> {
        let x0 = vec![T::zero(); rhs.len()];
        let out = gmres(|x: &Vec<T>| op.apply(x), &rhs.to_vec(), &x0, &self.options)?;
        Ok(SolveOutcome {
            solution: out.solution,
            converged: out.converged,
            iterations: out.iterations,
        })
    }

    fn solve_shifted(
        &self,
        op: &Op,
        rhss: &[&[T]],
        shift: Option<T>,
    ) -> Result<MultiSolveOutcome<T>> {
        let mut solutions = Vec::with_capacity(rhss.len());
        let mut iterations = Vec::with_capacity(rhss.len());
        let mut converged = true;
        for rhs in rhss {
            let x0 = vec![T::zero(); rhs.len()];
            let out = gmres(
                |x: &Vec<T>| op.apply_shifted(x, shift),
                &rhs.to_vec(),
                &x0,
                &self.options,
            )?;
            converged &= out.converged;
            iterations.push(out.iterations);
            solutions.push(out.solution);
        }
        Ok(MultiSolveOutcome {
            solutions,
            converged,
            iterations,
        })
    }
}

/// Result of a matrix-free solve in whatever vector representation the
/// caller chose.
#[derive(Debug, Clone)]
pub struct OpSolveOutcome<V> {
    /// The solution vector.
    pub solution: V,

    /// Whether the solver converged.
    pub converged: bool,

    /// Number of iterations performed.
    pub iterations: usize,
}

/// A solver that only needs the operator application.
///
/// This is the contract [`crate::MatrixFreeBls`] consumes; `V` is either a
/// flat `Vec` or a [`borderkit_core::BorderedVec`], matching what the
/// underlying iterative method expects.
pub trait MatrixFreeSolver<T: Scalar, V: VectorSpace<T>> {
    /// Solve `A x = rhs` given only `x -> A x`.
    fn solve_op<F: Fn(&V) -> V>(&self, apply: F, rhs: &V) -> Result<OpSolveOutcome<V>>;
}

impl<T: Scalar, V: VectorSpace<T>> MatrixFreeSolver<T, V> for GmresLinearSolver {
    fn solve_op<F: Fn(&V) -> V>(&self, apply: F, rhs: &V) -> Result<OpSolveOutcome<V>> {
        let x0 = rhs.zeros_like();
        let out = gmres(apply, rhs, &x0, &self.options)?;
        Ok(OpSolveOutcome {
            solution: out.solution,
            converged: out.converged,
            iterations: out.iterations,
        })
    }
}

/// Operator defined by a closure, for maps that never materialise a
/// matrix.
pub struct ClosureOp<T, F>
where
    F: Fn(&[T]) -> Vec<T>,
{
    dim: usize,
    apply: F,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Scalar, F: Fn(&[T]) -> Vec<T>> ClosureOp<T, F> {
    /// Wrap a closure as an operator of the given dimension.
    pub fn new(dim: usize, apply: F) -> Self {
        Self {
            dim,
            apply,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Scalar, F: Fn(&[T]) -> Vec<T>> LinearOp<T> for ClosureOp<T, F> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply(&self, x: &[T]) -> Vec<T> {
        (self.apply)(x)
    }
}
