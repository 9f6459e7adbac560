//! Bordered solves by full assembly.
//!
//! When `J` is stored as a matrix, the whole `(n+m) x (n+m)` bordered
//! system can be assembled and handed to a dense solver in one shot. This
//! trades memory for robustness near folds, where elimination loses
//! accuracy.

use borderkit_core::dense::Matrix;
use borderkit_core::scalar::Scalar;
use mdarray::DTensor;

use crate::bordered::{Bordered, BorderScaling, BorderedSolution, BorderedSolver};
use crate::error::Result;
use crate::linear::{LinearSolver, SolveOutcome};

/// Bordered solver that assembles the enlarged matrix and delegates to a
/// dense solver.
#[derive(Debug, Clone)]
pub struct MatrixBls<S> {
    solver: S,
}

impl<S> MatrixBls<S> {
    /// Assembly solver delegating to the given dense solver.
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    /// The dense solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }
}

/// Assemble the enlarged matrix
///
/// ```text
/// [ shift I + J              a_1 .. a_m ]
/// [ xi_u adjoint(b_i) rows   xi_p c     ]
/// ```
pub fn assemble<T: Scalar>(
    sys: &Bordered<'_, T, Matrix<T>>,
    scaling: &BorderScaling<T>,
) -> Matrix<T> {
    let n = sys.dim();
    let m = sys.border_width();
    DTensor::<T, 2>::from_fn([n + m, n + m], |idx| {
        let (i, j) = (idx[0], idx[1]);
        if i < n && j < n {
            let v = sys.op[[i, j]];
            match sys.shift {
                Some(sigma) if i == j => v + sigma,
                _ => v,
            }
        } else if i < n {
            sys.cols[j - n][i]
        } else if j < n {
            scaling.xi_u * sys.rows[i - n][j].conj()
        } else {
            scaling.xi_p * sys.corner[[i - n, j - n]]
        }
    })
}

impl<S> MatrixBls<S> {
    /// Solve by assembly, optionally transforming the border rows first.
    ///
    /// `row_transform` is handed each south-west row's `u`-part (already
    /// scaled by `xi_u`) and mutates it in place. Continuation uses this to
    /// fold in a weighted inner product whose action can only be applied,
    /// not stored. The transform must be a pure function of the row slice.
    pub fn solve_assembled<T>(
        &self,
        sys: &Bordered<'_, T, Matrix<T>>,
        r: &[T],
        s: &[T],
        scaling: &BorderScaling<T>,
        row_transform: Option<&dyn Fn(usize, &mut [T])>,
    ) -> Result<BorderedSolution<T>>
    where
        T: Scalar,
        S: LinearSolver<T, Matrix<T>>,
    {
        sys.check_rhs(r, s)?;
        let n = sys.dim();
        let m = sys.border_width();

        let mut a = assemble(sys, scaling);
        if let Some(transform) = row_transform {
            let mut buf = vec![T::zero(); n];
            for i in 0..m {
                for (j, slot) in buf.iter_mut().enumerate() {
                    *slot = a[[n + i, j]];
                }
                transform(i, &mut buf);
                for (j, value) in buf.iter().enumerate() {
                    a[[n + i, j]] = *value;
                }
            }
        }

        let mut rhs = r.to_vec();
        rhs.extend_from_slice(s);

        let SolveOutcome { mut solution, .. } = self.solver.solve(&a, &rhs)?;
        let p = solution.split_off(n);

        // The dense solve is treated as exact.
        Ok(BorderedSolution {
            u: solution,
            p,
            converged: true,
            inner_iterations: vec![1],
        })
    }
}

impl<T, S> BorderedSolver<T, Matrix<T>> for MatrixBls<S>
where
    T: Scalar,
    S: LinearSolver<T, Matrix<T>>,
{
    fn solve_bordered<D>(
        &self,
        sys: &Bordered<'_, T, Matrix<T>>,
        r: &[T],
        s: &[T],
        scaling: &BorderScaling<T>,
        _dotp: &D,
    ) -> Result<BorderedSolution<T>>
    where
        D: Fn(&[T], &[T]) -> T,
    {
        // Assembly pairs the border rows with `u` through the Euclidean
        // product; a non-Euclidean product enters through `solve_assembled`
        // and its row transform instead.
        self.solve_assembled(sys, r, s, scaling, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bordering::BorderingBls;
    use crate::linear::DenseLuSolver;
    use borderkit_core::dense::{eye, from_vec2d, ncols, nrows};
    use borderkit_core::vector::euclidean;

    fn bls() -> MatrixBls<DenseLuSolver> {
        MatrixBls::new(DenseLuSolver)
    }

    #[test]
    fn assembled_blocks_land_in_place() {
        let j = from_vec2d(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let cols = [vec![5.0, 6.0]];
        let rows = [vec![7.0, 8.0]];
        let corner = from_vec2d(vec![vec![9.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, Some(10.0)).unwrap();

        let a = assemble(&sys, &BorderScaling { xi_u: 2.0, xi_p: 3.0 });
        assert_eq!(nrows(&a), 3);
        assert_eq!(ncols(&a), 3);
        assert_eq!(a[[0, 0]], 11.0); // 1 + shift
        assert_eq!(a[[1, 1]], 14.0); // 4 + shift
        assert_eq!(a[[0, 1]], 2.0);
        assert_eq!(a[[0, 2]], 5.0);
        assert_eq!(a[[1, 2]], 6.0);
        assert_eq!(a[[2, 0]], 14.0); // xi_u * 7
        assert_eq!(a[[2, 1]], 16.0); // xi_u * 8
        assert_eq!(a[[2, 2]], 27.0); // xi_p * 9
    }

    #[test]
    fn identity_border_passes_through() {
        let j = eye::<f64>(3);
        let cols = [vec![0.0; 3]];
        let rows = [vec![0.0; 3]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();

        let sol = bls()
            .solve_bordered(
                &sys,
                &[1.0, 2.0, 3.0],
                &[4.0],
                &BorderScaling::default(),
                &euclidean,
            )
            .unwrap();
        assert!(sol.converged);
        assert_eq!(sol.inner_iterations, vec![1]);
        assert_eq!(sol.u, vec![1.0, 2.0, 3.0]);
        assert!((sol.p[0] - 4.0).abs() < 1e-14);
    }

    #[test]
    fn agrees_with_elimination() {
        let j = from_vec2d(vec![vec![2.0, 0.5], vec![-0.25, 3.0]]);
        let cols = [vec![1.0, -1.0]];
        let rows = [vec![0.5, 2.0]];
        let corner = from_vec2d(vec![vec![0.25]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, Some(0.5)).unwrap();
        let r = [1.0, 2.0];
        let s = [-1.0];
        let scaling = BorderScaling { xi_u: 0.4, xi_p: 0.6 };

        let assembled = bls()
            .solve_bordered(&sys, &r, &s, &scaling, &euclidean)
            .unwrap();
        let eliminated = BorderingBls::new(DenseLuSolver)
            .solve_bordered(&sys, &r, &s, &scaling, &euclidean)
            .unwrap();

        for (a, b) in assembled.u.iter().zip(eliminated.u.iter()) {
            assert!((a - b).abs_val() < 1e-12);
        }
        assert!((assembled.p[0] - eliminated.p[0]).abs_val() < 1e-12);
    }

    #[test]
    fn row_transform_embeds_a_weighted_product() {
        // dotp_w(x, y) = 2 x_0 y_0 + x_1 y_1, realised in the assembly by
        // scaling the border row entries.
        let weights = [2.0, 1.0];
        let dotp_w =
            move |x: &[f64], y: &[f64]| weights.iter().zip(x.iter().zip(y.iter()))
                .map(|(w, (xi, yi))| w * xi * yi)
                .sum::<f64>();

        let j = from_vec2d(vec![vec![2.0, 1.0], vec![0.0, 3.0]]);
        let cols = [vec![1.0, 0.5]];
        let rows = [vec![1.0, 1.0]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();
        let r = [1.0, 2.0];
        let s = [3.0];

        let transform =
            |_i: usize, row: &mut [f64]| {
                for (entry, w) in row.iter_mut().zip(weights.iter()) {
                    *entry *= w;
                }
            };
        let assembled = bls()
            .solve_assembled(&sys, &r, &s, &BorderScaling::default(), Some(&transform))
            .unwrap();

        let eliminated = BorderingBls::new(DenseLuSolver)
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &dotp_w)
            .unwrap();

        for (a, b) in assembled.u.iter().zip(eliminated.u.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((assembled.p[0] - eliminated.p[0]).abs() < 1e-12);
    }

    #[test]
    fn block_case_assembles_every_border() {
        let j = eye::<f64>(3);
        let cols = [vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]];
        let rows = [vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]];
        let corner = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();
        let r = [1.0, 1.0, 1.0];
        let s = [0.5, -0.5];

        let assembled = bls()
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();
        let eliminated = BorderingBls::new(DenseLuSolver)
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();

        for (a, b) in assembled.u.iter().zip(eliminated.u.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in assembled.p.iter().zip(eliminated.p.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
