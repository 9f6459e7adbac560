//! Block elimination with correction.
//!
//! Eliminates the border through solves with the inner operator alone: two
//! solves in the scalar case, `m + 1` in the block case, plus an optional
//! residual-driven correction loop. This is the workhorse back-end when `J`
//! is only available through a linear solver.

use borderkit_core::lu::PartialPivLu;
use borderkit_core::scalar::Scalar;
use borderkit_core::vector::{axpy, norm2};
use mdarray::DTensor;

use crate::bordered::{Bordered, BorderScaling, BorderedSolution, BorderedSolver};
use crate::error::{BorderedError, Result};
use crate::linear::{LinearOp, LinearSolver};

/// Bordered solver based on border elimination with corrections.
///
/// The inner `solver` handles the square operator; `tol`,
/// `check_precision` and `max_corrections` steer the refinement loop.
/// Instances are immutable after construction and hold no per-solve state.
#[derive(Debug, Clone)]
pub struct BorderingBls<S> {
    solver: S,
    tol: f64,
    check_precision: bool,
    max_corrections: usize,
}

impl<S> BorderingBls<S> {
    /// Elimination solver around the given inner linear solver.
    ///
    /// Defaults: `tol = 1e-12`, `check_precision = true`, one correction.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            tol: 1e-12,
            check_precision: true,
            max_corrections: 1,
        }
    }

    /// Set the residual threshold of the correction loop.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Enable or disable the correction loop.
    pub fn with_check_precision(mut self, check_precision: bool) -> Self {
        self.check_precision = check_precision;
        self
    }

    /// Set the maximum number of corrections.
    ///
    /// At least one correction is required; zero is a configuration error.
    pub fn with_max_corrections(mut self, max_corrections: usize) -> Result<Self> {
        if max_corrections == 0 {
            return Err(BorderedError::InvalidConfig {
                message: "max_corrections must be at least 1; \
                          disable check_precision to skip refinement"
                    .to_string(),
            });
        }
        self.max_corrections = max_corrections;
        Ok(self)
    }

    /// The inner linear solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }
}

/// Split the two solutions of a paired solve, in input order.
fn take_pair<T>(mut solutions: Vec<Vec<T>>) -> Result<(Vec<T>, Vec<T>)> {
    let n = solutions.len();
    match (solutions.pop(), solutions.pop()) {
        (Some(second), Some(first)) if solutions.is_empty() => Ok((first, second)),
        _ => Err(BorderedError::DimensionMismatch {
            what: "inner solver output",
            expected: 2,
            actual: n,
        }),
    }
}

impl<S> BorderingBls<S> {
    /// Solve the scalar (`m = 1`) bordered system
    ///
    /// ```text
    /// (shift I + J) u + p col            = r
    /// xi_u dotp(row, u) + xi_p corner p  = s
    /// ```
    ///
    /// by one elimination step and up to `max_corrections` residual
    /// corrections. The elimination denominator
    /// `xi_p corner - xi_u dotp(row, x2)` vanishes at fold points; it is
    /// used as-is, so the caller sees whatever the division produced and
    /// can watch for the fold through sign changes.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_scalar<T, Op, D>(
        &self,
        op: &Op,
        col: &[T],
        row: &[T],
        corner: T,
        r: &[T],
        s: T,
        scaling: &BorderScaling<T>,
        dotp: &D,
        shift: Option<T>,
    ) -> Result<BorderedSolution<T>>
    where
        T: Scalar,
        Op: LinearOp<T>,
        S: LinearSolver<T, Op>,
        D: Fn(&[T], &[T]) -> T,
    {
        let n = op.dim();
        for (what, len) in [("border column", col.len()), ("border row", row.len()),
            ("state right-hand side", r.len())]
        {
            if len != n {
                return Err(BorderedError::DimensionMismatch {
                    what,
                    expected: n,
                    actual: len,
                });
            }
        }

        // Elimination step: both solves share the operator (and its
        // factorisation, when the back-end has one).
        let first = self.solver.solve_shifted(op, &[r, col], shift)?;
        let mut converged = first.converged;
        let mut iterations = first.iterations;
        let (x1, x2) = take_pair(first.solutions)?;

        let denom = scaling.xi_p * corner - scaling.xi_u * dotp(row, &x2);
        let mut p = (s - scaling.xi_u * dotp(row, &x1)) / denom;
        let mut u = x1;
        axpy(-p, &x2, &mut u);

        if self.check_precision {
            for _ in 0..self.max_corrections {
                // Residual pair of the current iterate.
                let ju = op.apply_shifted(&u, shift);
                let mut res_u: Vec<T> =
                    r.iter().zip(ju.iter()).map(|(ri, ji)| *ri - *ji).collect();
                axpy(-p, col, &mut res_u);
                let res_p = s - scaling.xi_p * corner * p - scaling.xi_u * dotp(row, &u);

                if norm2(&res_u) <= self.tol && res_p.abs_val() <= self.tol {
                    break;
                }

                // Eliminate again on the residual pair.
                let corr = self.solver.solve_shifted(op, &[&res_u, col], shift)?;
                converged &= corr.converged;
                iterations.extend(corr.iterations);
                let (c1, c2) = take_pair(corr.solutions)?;

                let denom = scaling.xi_p * corner - scaling.xi_u * dotp(row, &c2);
                let dp = (res_p - scaling.xi_u * dotp(row, &c1)) / denom;
                axpy(T::one(), &c1, &mut u);
                axpy(-dp, &c2, &mut u);
                p = p + dp;
            }
        }

        Ok(BorderedSolution {
            u,
            p: vec![p],
            converged,
            inner_iterations: iterations,
        })
    }

    /// Solve the block (`m >= 1`) bordered system through `m + 1` inner
    /// solves and a dense Schur-complement solve on the border unknowns.
    ///
    /// The Schur complement is factored by the same partial-pivot LU as
    /// everything else, with no additional conditioning safeguards; a
    /// singular border surfaces as a factorisation error.
    pub fn solve_block<T, Op, D>(
        &self,
        sys: &Bordered<'_, T, Op>,
        r: &[T],
        s: &[T],
        scaling: &BorderScaling<T>,
        dotp: &D,
    ) -> Result<BorderedSolution<T>>
    where
        T: Scalar,
        Op: LinearOp<T>,
        S: LinearSolver<T, Op>,
        D: Fn(&[T], &[T]) -> T,
    {
        sys.check_rhs(r, s)?;
        let m = sys.border_width();

        let mut rhss: Vec<&[T]> = Vec::with_capacity(m + 1);
        rhss.push(r);
        for col in sys.cols {
            rhss.push(col);
        }

        let out = self.solver.solve_shifted(sys.op, &rhss, sys.shift)?;
        if out.solutions.len() != m + 1 {
            return Err(BorderedError::DimensionMismatch {
                what: "inner solver output",
                expected: m + 1,
                actual: out.solutions.len(),
            });
        }
        let mut solutions = out.solutions;
        let border_sols = solutions.split_off(1);
        let x1 = match solutions.pop() {
            Some(v) => v,
            None => {
                return Err(BorderedError::DimensionMismatch {
                    what: "inner solver output",
                    expected: m + 1,
                    actual: 0,
                })
            }
        };

        // Schur complement on the border unknowns.
        let schur = DTensor::<T, 2>::from_fn([m, m], |idx| {
            scaling.xi_p * sys.corner[[idx[0], idx[1]]]
                - scaling.xi_u * dotp(&sys.rows[idx[0]], &border_sols[idx[1]])
        });
        let rhs_p: Vec<T> = (0..m)
            .map(|i| s[i] - scaling.xi_u * dotp(&sys.rows[i], &x1))
            .collect();

        let p = PartialPivLu::new(&schur)?.solve(&rhs_p)?;

        let mut u = x1;
        for (pj, x2j) in p.iter().zip(border_sols.iter()) {
            axpy(-*pj, x2j, &mut u);
        }

        Ok(BorderedSolution {
            u,
            p,
            converged: out.converged,
            inner_iterations: out.iterations,
        })
    }
}

impl<T, Op, S> BorderedSolver<T, Op> for BorderingBls<S>
where
    T: Scalar,
    Op: LinearOp<T>,
    S: LinearSolver<T, Op>,
{
    fn solve_bordered<D>(
        &self,
        sys: &Bordered<'_, T, Op>,
        r: &[T],
        s: &[T],
        scaling: &BorderScaling<T>,
        dotp: &D,
    ) -> Result<BorderedSolution<T>>
    where
        D: Fn(&[T], &[T]) -> T,
    {
        sys.check_rhs(r, s)?;
        if sys.border_width() == 1 {
            self.solve_scalar(
                sys.op,
                &sys.cols[0],
                &sys.rows[0],
                sys.corner[[0, 0]],
                r,
                s[0],
                scaling,
                dotp,
                sys.shift,
            )
        } else {
            self.solve_block(sys, r, s, scaling, dotp)
        }
    }
}
