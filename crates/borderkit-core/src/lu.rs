//! Partial-pivoting LU factorisation of square dense matrices.
//!
//! The factorisation is computed in place over one matrix buffer holding
//! both triangular factors, with a row permutation chosen by largest
//! absolute pivot. It is kept around so repeated solves against the same
//! operator (as continuation does, thousands of times) skip refactorising.

use crate::dense::{ncols, nrows, zeros, Matrix};
use crate::error::{CoreError, Result};
use crate::scalar::Scalar;

/// Row-pivoted LU factorisation `P * A = L * U`.
///
/// `L` is unit lower triangular and shares storage with `U`.
#[derive(Debug, Clone)]
pub struct PartialPivLu<T: Scalar> {
    /// Combined factors: strictly lower part is L, upper part (with
    /// diagonal) is U.
    lu: Matrix<T>,
    /// Row permutation: row `i` of the factored system is row `perm[i]`
    /// of the input.
    perm: Vec<usize>,
}

impl<T: Scalar> PartialPivLu<T> {
    /// Factorise a square matrix.
    ///
    /// Returns [`CoreError::SingularMatrix`] when a pivot column has no
    /// entry distinguishable from zero. No conditioning safeguard beyond
    /// that is applied; a nearly singular matrix factors and the caller
    /// interprets the (possibly wild) solution.
    pub fn new(a: &Matrix<T>) -> Result<Self> {
        let n = nrows(a);
        if ncols(a) != n {
            return Err(CoreError::NotSquare {
                nrows: n,
                ncols: ncols(a),
            });
        }

        let mut lu = a.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Pick the largest pivot in column k at or below the diagonal.
            let mut pivot_row = k;
            let mut pivot_abs = lu[[k, k]].abs_val();
            for i in (k + 1)..n {
                let v = lu[[i, k]].abs_val();
                if v > pivot_abs {
                    pivot_abs = v;
                    pivot_row = i;
                }
            }

            if pivot_abs.is_nan() {
                return Err(CoreError::NaNEncountered {
                    what: "LU pivot".to_string(),
                });
            }
            if pivot_abs < f64::EPSILON {
                return Err(CoreError::SingularMatrix);
            }

            if pivot_row != k {
                for j in 0..n {
                    let tmp = lu[[k, j]];
                    lu[[k, j]] = lu[[pivot_row, j]];
                    lu[[pivot_row, j]] = tmp;
                }
                perm.swap(k, pivot_row);
            }

            let pivot = lu[[k, k]];

            // Scale column below the pivot, then update the trailing block:
            // A[k+1:, k+1:] -= A[k+1:, k] * A[k, k+1:]
            for i in (k + 1)..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                for j in (k + 1)..n {
                    let old = lu[[i, j]];
                    lu[[i, j]] = old - factor * lu[[k, j]];
                }
            }
        }

        Ok(Self { lu, perm })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        nrows(&self.lu)
    }

    /// Solve `A * x = b` using the stored factors.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let n = self.dim();
        if b.len() != n {
            return Err(CoreError::DimensionMismatch {
                expected: n,
                actual: b.len(),
            });
        }

        // Forward substitution on the permuted rhs, L has unit diagonal.
        let mut y = vec![T::zero(); n];
        for i in 0..n {
            let mut sum = b[self.perm[i]];
            for j in 0..i {
                sum = sum - self.lu[[i, j]] * y[j];
            }
            y[i] = sum;
        }

        // Back substitution against U.
        let mut x = vec![T::zero(); n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum = sum - self.lu[[i, j]] * x[j];
            }
            x[i] = sum / self.lu[[i, i]];
        }

        Ok(x)
    }

    /// Solve `A * X = B` column by column, reusing the factorisation.
    pub fn solve_mat(&self, b: &Matrix<T>) -> Result<Matrix<T>> {
        let n = self.dim();
        if nrows(b) != n {
            return Err(CoreError::DimensionMismatch {
                expected: n,
                actual: nrows(b),
            });
        }
        let m = ncols(b);
        let mut x = zeros(n, m);
        for k in 0..m {
            let col: Vec<T> = (0..n).map(|i| b[[i, k]]).collect();
            let sol = self.solve(&col)?;
            for i in 0..n {
                x[[i, k]] = sol[i];
            }
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::{from_vec2d, matvec};
    use crate::scalar::Scalar;
    use crate::vector::norm2;

    #[test]
    fn solves_known_2x2() {
        let a = from_vec2d(vec![vec![2.0, 1.0], vec![5.0, 7.0]]);
        let lu = PartialPivLu::new(&a).expect("factorisation should succeed");
        let x = lu.solve(&[11.0, 13.0]).expect("solve should succeed");
        assert!((x[0] - 64.0 / 9.0).abs_val() < 1e-12);
        assert!((x[1] + 29.0 / 9.0).abs_val() < 1e-12);
    }

    fn residual_small_generic<T: Scalar>() {
        let a = from_vec2d(vec![
            vec![T::from_f64(4.0), T::from_f64(-2.0), T::from_f64(1.0)],
            vec![T::from_f64(1.0), T::from_f64(3.0), T::from_f64(-1.0)],
            vec![T::from_f64(2.0), T::from_f64(1.0), T::from_f64(5.0)],
        ]);
        let b = vec![T::from_f64(1.0), T::from_f64(2.0), T::from_f64(3.0)];
        let lu = PartialPivLu::new(&a).unwrap();
        let x = lu.solve(&b).unwrap();
        let mut r = matvec(&a, &x);
        for (ri, bi) in r.iter_mut().zip(b.iter()) {
            *ri = *ri - *bi;
        }
        assert!(norm2(&r) < 1e-12);
    }

    crate::scalar_tests!(residual_small, residual_small_generic);

    #[test]
    fn pivoting_handles_zero_diagonal() {
        let a = from_vec2d(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let lu = PartialPivLu::new(&a).expect("permutation matrix should factor");
        let x = lu.solve(&[5.0, 7.0]).unwrap();
        assert_eq!(x, vec![7.0, 5.0]);
    }

    #[test]
    fn reports_singular() {
        let a = from_vec2d(vec![vec![1.0, 2.0], vec![2.0, 4.0]]);
        let err = PartialPivLu::new(&a).expect_err("rank-1 matrix should be singular");
        assert!(matches!(err, CoreError::SingularMatrix));
    }

    #[test]
    fn rejects_non_square() {
        let a = from_vec2d(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let err = PartialPivLu::new(&a).expect_err("non-square input should be rejected");
        assert!(matches!(err, CoreError::NotSquare { .. }));
    }

    #[test]
    fn tiny_pivot_is_not_rejected() {
        // A severely ill-conditioned but nonsingular matrix still factors;
        // interpreting the result is the caller's business.
        let a = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, 1e-12]]);
        let lu = PartialPivLu::new(&a).unwrap();
        let x = lu.solve(&[1.0, 1.0]).unwrap();
        assert!((x[0] - 1.0).abs_val() < 1e-12);
        assert!((x[1] - 1e12).abs_val() < 1.0);
    }

    #[test]
    fn multi_rhs_reuses_factorisation() {
        let a = from_vec2d(vec![vec![3.0, 1.0], vec![1.0, 2.0]]);
        let b = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let lu = PartialPivLu::new(&a).unwrap();
        let inv = lu.solve_mat(&b).unwrap();
        // A * A^{-1} = I
        let prod = crate::dense::matmul(&a, &inv);
        for i in 0..2 {
            for j in 0..2 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((prod[[i, j]] - expect).abs_val() < 1e-12);
            }
        }
    }
}
