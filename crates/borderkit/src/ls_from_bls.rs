//! A plain linear solver backed by a bordered solve.
//!
//! The last row and column of a square matrix are treated as a border, the
//! interior block is factorised once, and the elimination solver does the
//! rest. This closes the loop: a bordered solver is usable wherever a plain
//! linear solver is, including as the inner solver of another bordered
//! solve.

use borderkit_core::dense::{ncols, nrows, Matrix};
use borderkit_core::scalar::Scalar;
use borderkit_core::vector::euclidean;
use mdarray::DTensor;

use crate::bordered::BorderScaling;
use crate::bordering::BorderingBls;
use crate::error::{BorderedError, Result};
use crate::linear::{
    CachedLuSolver, FactorizedOp, LinearSolver, MultiSolveOutcome, SolveOutcome,
};

/// Linear solver that partitions its matrix and eliminates the border.
#[derive(Debug, Clone)]
pub struct LsFromBls {
    bls: BorderingBls<CachedLuSolver>,
}

impl Default for LsFromBls {
    fn default() -> Self {
        Self::new()
    }
}

impl LsFromBls {
    /// Solver with the default elimination settings.
    pub fn new() -> Self {
        Self {
            bls: BorderingBls::new(CachedLuSolver),
        }
    }

    /// Partition `(shift I + M)` into interior, border column, border row
    /// and corner, factorising the interior once.
    ///
    /// The border row is stored pre-conjugated so the Euclidean pairing
    /// used by the elimination reproduces the matrix row exactly.
    fn partition<T: Scalar>(
        m: &Matrix<T>,
        shift: Option<T>,
    ) -> Result<(FactorizedOp<T>, Vec<T>, Vec<T>, T)> {
        let size = nrows(m);
        if ncols(m) != size {
            return Err(BorderedError::Core(borderkit_core::CoreError::NotSquare {
                nrows: size,
                ncols: ncols(m),
            }));
        }
        if size < 2 {
            return Err(BorderedError::DimensionMismatch {
                what: "partitioned matrix",
                expected: 2,
                actual: size,
            });
        }
        let n = size - 1;

        let interior = DTensor::<T, 2>::from_fn([n, n], |idx| {
            let v = m[[idx[0], idx[1]]];
            match shift {
                Some(sigma) if idx[0] == idx[1] => v + sigma,
                _ => v,
            }
        });
        let col: Vec<T> = (0..n).map(|i| m[[i, n]]).collect();
        let row: Vec<T> = (0..n).map(|j| m[[n, j]].conj()).collect();
        let corner = match shift {
            Some(sigma) => m[[n, n]] + sigma,
            None => m[[n, n]],
        };

        Ok((FactorizedOp::new(interior)?, col, row, corner))
    }

    fn solve_partitioned<T: Scalar>(
        &self,
        op: &FactorizedOp<T>,
        col: &[T],
        row: &[T],
        corner: T,
        rhs: &[T],
    ) -> Result<SolveOutcome<T>> {
        let n = crate::linear::LinearOp::dim(op);
        if rhs.len() != n + 1 {
            return Err(BorderedError::DimensionMismatch {
                what: "right-hand side",
                expected: n + 1,
                actual: rhs.len(),
            });
        }

        let sol = self.bls.solve_scalar(
            op,
            col,
            row,
            corner,
            &rhs[..n],
            rhs[n],
            &BorderScaling::default(),
            &euclidean,
            None,
        )?;

        let mut solution = sol.u;
        solution.extend_from_slice(&sol.p);
        Ok(SolveOutcome {
            solution,
            converged: sol.converged,
            iterations: sol.inner_iterations.iter().sum(),
        })
    }
}

impl<T: Scalar> LinearSolver<T, Matrix<T>> for LsFromBls {
    fn solve(&self, m: &Matrix<T>, rhs: &[T]) -> Result<SolveOutcome<T>> {
        let (op, col, row, corner) = Self::partition(m, None)?;
        self.solve_partitioned(&op, &col, &row, corner, rhs)
    }

    fn solve_shifted(
        &self,
        m: &Matrix<T>,
        rhss: &[&[T]],
        shift: Option<T>,
    ) -> Result<MultiSolveOutcome<T>> {
        // One partition (and one interior factorisation) shared by every
        // right-hand side.
        let (op, col, row, corner) = Self::partition(m, shift)?;

        let mut solutions = Vec::with_capacity(rhss.len());
        let mut iterations = Vec::with_capacity(rhss.len());
        let mut converged = true;
        for rhs in rhss {
            let out = self.solve_partitioned(&op, &col, &row, corner, rhs)?;
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
