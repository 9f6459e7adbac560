//! Dense matrix helpers on top of `mdarray`.
//!
//! Matrices are stored as rank-2 `DTensor`s and indexed with `m[[i, j]]`.
//! The helpers here are the small surface the solvers need; anything larger
//! (factorisations, Krylov methods) lives in its own module.

use crate::scalar::Scalar;
use mdarray::DTensor;

/// Dense matrix type used throughout the workspace.
pub type Matrix<T> = DTensor<T, 2>;

/// Create a zero matrix of the given size.
pub fn zeros<T: Scalar>(nr: usize, nc: usize) -> Matrix<T> {
    DTensor::<T, 2>::from_fn([nr, nc], |_| T::zero())
}

/// Create an identity matrix of the given size.
pub fn eye<T: Scalar>(n: usize) -> Matrix<T> {
    DTensor::<T, 2>::from_fn([n, n], |idx| if idx[0] == idx[1] { T::one() } else { T::zero() })
}

/// Build a matrix from row vectors.
///
/// Panics if the rows are ragged; that is a programmer error.
pub fn from_vec2d<T: Scalar>(rows: Vec<Vec<T>>) -> Matrix<T> {
    let nr = rows.len();
    let nc = if nr == 0 { 0 } else { rows[0].len() };
    for row in &rows {
        assert_eq!(row.len(), nc, "from_vec2d requires rows of equal length");
    }
    DTensor::<T, 2>::from_fn([nr, nc], |idx| rows[idx[0]][idx[1]])
}

/// Number of rows.
pub fn nrows<T: Scalar>(m: &Matrix<T>) -> usize {
    m.dim(0)
}

/// Number of columns.
pub fn ncols<T: Scalar>(m: &Matrix<T>) -> usize {
    m.dim(1)
}

/// Matrix-vector product `m * x`.
pub fn matvec<T: Scalar>(m: &Matrix<T>, x: &[T]) -> Vec<T> {
    let (nr, nc) = (nrows(m), ncols(m));
    debug_assert_eq!(nc, x.len());
    let mut out = vec![T::zero(); nr];
    for i in 0..nr {
        let mut acc = T::zero();
        for j in 0..nc {
            acc = acc + m[[i, j]] * x[j];
        }
        out[i] = acc;
    }
    out
}

/// Matrix-matrix product `a * b`.
pub fn matmul<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>) -> Matrix<T> {
    let (nr, nk) = (nrows(a), ncols(a));
    debug_assert_eq!(nk, nrows(b));
    let nc = ncols(b);
    DTensor::<T, 2>::from_fn([nr, nc], |idx| {
        let mut acc = T::zero();
        for k in 0..nk {
            acc = acc + a[[idx[0], k]] * b[[k, idx[1]]];
        }
        acc
    })
}

/// Conjugate transpose.
pub fn adjoint<T: Scalar>(m: &Matrix<T>) -> Matrix<T> {
    DTensor::<T, 2>::from_fn([ncols(m), nrows(m)], |idx| m[[idx[1], idx[0]]].conj())
}
