//! The bordered-system description shared by every solver back-end.
//!
//! A bordered system augments a square operator `J` with `m` extra columns
//! `a_j`, `m` extra rows `b_i` and an `m x m` corner `c`:
//!
//! ```text
//! (shift I + J) u  +  sum_j p_j a_j          = r
//! xi_u (dotp(b_i, u))_i  +  xi_p (c p)_i     = s_i
//! ```
//!
//! The inner product `dotp` on the state space is a first-class parameter;
//! continuation embeds arclength weighting and discretisation quadrature in
//! it.

use borderkit_core::dense::{ncols, nrows, Matrix};
use borderkit_core::scalar::Scalar;
use borderkit_core::vector::axpy;

use crate::error::{BorderedError, Result};
use crate::linear::LinearOp;

/// A square operator with `m` border rows/columns and a corner block.
///
/// All parts are borrowed read-only for the duration of a solve; solvers may
/// use scratch storage but never retain these references.
#[derive(Debug)]
pub struct Bordered<'a, T: Scalar, Op> {
    /// The square operator `J`.
    pub op: &'a Op,
    /// Border columns `a_1 .. a_m`, each of length `n`.
    pub cols: &'a [Vec<T>],
    /// Border rows `b_1 .. b_m`, each of length `n`, paired with `u`
    /// through the configurable inner product.
    pub rows: &'a [Vec<T>],
    /// Corner block `c`, `m x m`.
    pub corner: &'a Matrix<T>,
    /// Optional spectral shift applied to `J`.
    pub shift: Option<T>,
}

impl<'a, T: Scalar, Op: LinearOp<T>> Bordered<'a, T, Op> {
    /// Describe a bordered system, validating block dimensions.
    pub fn new(
        op: &'a Op,
        cols: &'a [Vec<T>],
        rows: &'a [Vec<T>],
        corner: &'a Matrix<T>,
        shift: Option<T>,
    ) -> Result<Self> {
        let n = op.dim();
        let m = cols.len();
        if rows.len() != m {
            return Err(BorderedError::DimensionMismatch {
                what: "border rows",
                expected: m,
                actual: rows.len(),
            });
        }
        if nrows(corner) != m || ncols(corner) != m {
            return Err(BorderedError::DimensionMismatch {
                what: "corner block",
                expected: m,
                actual: nrows(corner).max(ncols(corner)),
            });
        }
        for col in cols {
            if col.len() != n {
                return Err(BorderedError::DimensionMismatch {
                    what: "border column",
                    expected: n,
                    actual: col.len(),
                });
            }
        }
        for row in rows {
            if row.len() != n {
                return Err(BorderedError::DimensionMismatch {
                    what: "border row",
                    expected: n,
                    actual: row.len(),
                });
            }
        }
        Ok(Self {
            op,
            cols,
            rows,
            corner,
            shift,
        })
    }

    /// State dimension `n`.
    pub fn dim(&self) -> usize {
        self.op.dim()
    }

    /// Border width `m`.
    pub fn border_width(&self) -> usize {
        self.cols.len()
    }

    /// Check the right-hand side pair against the system dimensions.
    pub fn check_rhs(&self, r: &[T], s: &[T]) -> Result<()> {
        if r.len() != self.dim() {
            return Err(BorderedError::DimensionMismatch {
                what: "state right-hand side",
                expected: self.dim(),
                actual: r.len(),
            });
        }
        if s.len() != self.border_width() {
            return Err(BorderedError::DimensionMismatch {
                what: "border right-hand side",
                expected: self.border_width(),
                actual: s.len(),
            });
        }
        Ok(())
    }
}

/// Scaling applied to the border equation.
///
/// Pseudo-arclength continuation derives these from the arclength weight
/// `theta`; they are treated as independent scalars here.
#[derive(Debug, Clone, Copy)]
pub struct BorderScaling<T> {
    /// Weight on the `dotp(b_i, u)` terms.
    pub xi_u: T,
    /// Weight on the corner block.
    pub xi_p: T,
}

impl<T: Scalar> Default for BorderScaling<T> {
    fn default() -> Self {
        Self {
            xi_u: T::one(),
            xi_p: T::one(),
        }
    }
}

impl<T: Scalar> BorderScaling<T> {
    /// Arclength weighting: `xi_u = theta`, `xi_p = 1 - theta`.
    pub fn arclength(theta: f64) -> Self {
        Self {
            xi_u: T::from_f64(theta),
            xi_p: T::from_f64(1.0 - theta),
        }
    }
}

/// Solution of a bordered system.
#[derive(Debug, Clone)]
pub struct BorderedSolution<T> {
    /// State part of the solution.
    pub u: Vec<T>,
    /// Border part of the solution, `m` scalars.
    pub p: Vec<T>,
    /// AND of the convergence flags of every inner solve.
    pub converged: bool,
    /// Iteration count of each inner solve, in the order they ran.
    pub inner_iterations: Vec<usize>,
}

/// The single contract every bordered back-end exposes.
pub trait BorderedSolver<T: Scalar, Op: LinearOp<T>> {
    /// Solve the bordered system for the right-hand side pair `(r, s)`.
    fn solve_bordered<D>(
        &self,
        sys: &Bordered<'_, T, Op>,
        r: &[T],
        s: &[T],
        scaling: &BorderScaling<T>,
        dotp: &D,
    ) -> Result<BorderedSolution<T>>
    where
        D: Fn(&[T], &[T]) -> T;
}

/// Apply the bordered operator to a candidate `(u, p)`.
///
/// This is the map the matrix-free back-end wraps, and what residual
/// computation applies; only operator application on `J` is needed.
pub fn apply_bordered<T, Op, D>(
    sys: &Bordered<'_, T, Op>,
    scaling: &BorderScaling<T>,
    dotp: &D,
    u: &[T],
    p: &[T],
) -> (Vec<T>, Vec<T>)
where
    T: Scalar,
    Op: LinearOp<T>,
    D: Fn(&[T], &[T]) -> T,
{
    let mut out_u = sys.op.apply_shifted(u, sys.shift);
    for (pj, col) in p.iter().zip(sys.cols.iter()) {
        axpy(*pj, col, &mut out_u);
    }

    let m = sys.border_width();
    let mut out_p = vec![T::zero(); m];
    for (i, out) in out_p.iter_mut().enumerate() {
        let mut cp = T::zero();
        for (j, pj) in p.iter().enumerate() {
            cp = cp + sys.corner[[i, j]] * *pj;
        }
        *out = scaling.xi_u * dotp(&sys.rows[i], u) + scaling.xi_p * cp;
    }

    (out_u, out_p)
}

/// Residual pair `(r - B(u, p)_u, s - B(u, p)_p)` of a candidate solution.
pub fn residual<T, Op, D>(
    sys: &Bordered<'_, T, Op>,
    r: &[T],
    s: &[T],
    scaling: &BorderScaling<T>,
    dotp: &D,
    u: &[T],
    p: &[T],
) -> (Vec<T>, Vec<T>)
where
    T: Scalar,
    Op: LinearOp<T>,
    D: Fn(&[T], &[T]) -> T,
{
    let (bu, bp) = apply_bordered(sys, scaling, dotp, u, p);
    let res_u = r.iter().zip(bu.iter()).map(|(ri, bi)| *ri - *bi).collect();
    let res_p = s.iter().zip(bp.iter()).map(|(si, bi)| *si - *bi).collect();
    (res_u, res_p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use borderkit_core::dense::{eye, from_vec2d};
    use borderkit_core::vector::euclidean;

    #[test]
    fn apply_matches_hand_computation() {
        let j = from_vec2d(vec![vec![2.0, 0.0], vec![0.0, 3.0]]);
        let cols = [vec![1.0, 1.0]];
        let rows = [vec![1.0, 1.0]];
        let corner = from_vec2d(vec![vec![0.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();

        let (ou, op) = apply_bordered(
            &sys,
            &BorderScaling::default(),
            &euclidean,
            &[1.0, 1.0],
            &[1.0],
        );
        // J u + a p = (2, 3) + (1, 1)
        assert_eq!(ou, vec![3.0, 4.0]);
        // b . u + c p = 2 + 0
        assert_eq!(op, vec![2.0]);
    }

    #[test]
    fn shift_enters_the_state_block_only() {
        let j = eye::<f64>(2);
        let cols = [vec![0.0, 0.0]];
        let rows = [vec![0.0, 0.0]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, Some(4.0)).unwrap();

        let (ou, op) = apply_bordered(
            &sys,
            &BorderScaling::default(),
            &euclidean,
            &[1.0, 2.0],
            &[3.0],
        );
        assert_eq!(ou, vec![5.0, 10.0]);
        assert_eq!(op, vec![3.0]);
    }

    #[test]
    fn mismatched_border_rows_are_fatal() {
        let j = eye::<f64>(2);
        let cols = [vec![0.0, 0.0]];
        let rows: [Vec<f64>; 2] = [vec![0.0, 0.0], vec![0.0, 0.0]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let err = Bordered::new(&j, &cols, &rows, &corner, None)
            .expect_err("row/column count mismatch should be rejected");
        assert!(matches!(err, BorderedError::DimensionMismatch { .. }));
    }

    #[test]
    fn residual_vanishes_at_the_solution() {
        let j = eye::<f64>(3);
        let cols = [vec![0.0, 0.0, 0.0]];
        let rows = [vec![0.0, 0.0, 0.0]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();

        let r = [1.0, 2.0, 3.0];
        let s = [4.0];
        let (res_u, res_p) = residual(
            &sys,
            &r,
            &s,
            &BorderScaling::default(),
            &euclidean,
            &[1.0, 2.0, 3.0],
            &[4.0],
        );
        assert!(res_u.iter().all(|v| v.abs() < 1e-15));
        assert!(res_p.iter().all(|v| v.abs() < 1e-15));
    }
}
