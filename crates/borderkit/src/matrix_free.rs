//! Bordered solves by operator wrapping.
//!
//! Nothing is assembled or factorised here: the bordered system is exposed
//! to an iterative solver as a single linear map on the enlarged space.
//! The right-hand side and the iterates live either in the structured
//! composite representation or in one flat sequence, whichever the
//! configured solver expects; the structured form skips an `n`-element
//! copy per outer iteration.

use borderkit_core::scalar::Scalar;
use borderkit_core::vector::BorderedVec;

use crate::bordered::{apply_bordered, Bordered, BorderScaling, BorderedSolution, BorderedSolver};
use crate::error::Result;
use crate::linear::{LinearOp, MatrixFreeSolver};

/// Bordered solver that wraps the system as one linear operator and hands
/// it to a matrix-free solver.
#[derive(Debug, Clone)]
pub struct MatrixFreeBls<S> {
    solver: S,
    use_bordered_vec: bool,
}

impl<S> MatrixFreeBls<S> {
    /// Operator-wrapping solver around the given matrix-free back-end.
    ///
    /// Defaults to the structured composite representation.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            use_bordered_vec: true,
        }
    }

    /// Choose between the composite representation and one flat sequence.
    pub fn with_bordered_storage(mut self, use_bordered_vec: bool) -> Self {
        self.use_bordered_vec = use_bordered_vec;
        self
    }

    /// Whether iterates are kept in the composite representation.
    pub fn uses_bordered_storage(&self) -> bool {
        self.use_bordered_vec
    }

    /// The matrix-free back-end.
    pub fn solver(&self) -> &S {
        &self.solver
    }
}

impl<T, Op, S> BorderedSolver<T, Op> for MatrixFreeBls<S>
where
    T: Scalar,
    Op: LinearOp<T>,
    S: MatrixFreeSolver<T, Vec<T>> + MatrixFreeSolver<T, BorderedVec<T>>,
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
        let n = sys.dim();

        if self.use_bordered_vec {
            let rhs = BorderedVec::new(r.to_vec(), s.to_vec());
            let out = self.solver.solve_op(
                |x: &BorderedVec<T>| {
                    let (u, p) = apply_bordered(sys, scaling, dotp, &x.u, &x.p);
                    BorderedVec::new(u, p)
                },
                &rhs,
            )?;
            Ok(BorderedSolution {
                u: out.solution.u,
                p: out.solution.p,
                converged: out.converged,
                inner_iterations: vec![out.iterations],
            })
        } else {
            let mut rhs = r.to_vec();
            rhs.extend_from_slice(s);
            let out = self.solver.solve_op(
                |x: &Vec<T>| {
                    let (mut u, p) = apply_bordered(sys, scaling, dotp, &x[..n], &x[n..]);
                    u.extend_from_slice(&p);
                    u
                },
                &rhs,
            )?;
            let mut u = out.solution;
            let p = u.split_off(n);
            Ok(BorderedSolution {
                u,
                p,
                converged: out.converged,
                inner_iterations: vec![out.iterations],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bordering::BorderingBls;
    use crate::linear::{DenseLuSolver, GmresLinearSolver};
    use crate::matrix::MatrixBls;
    use borderkit_core::dense::{eye, from_vec2d};
    use borderkit_core::gmres::GmresOptions;
    use borderkit_core::vector::euclidean;

    fn tight_gmres() -> GmresLinearSolver {
        GmresLinearSolver::new(GmresOptions::new().with_rtol(1e-13))
    }

    #[test]
    fn identity_border_both_representations() {
        let j = eye::<f64>(3);
        let cols = [vec![0.0; 3]];
        let rows = [vec![0.0; 3]];
        let corner = from_vec2d(vec![vec![1.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();
        let r = [1.0, 2.0, 3.0];
        let s = [4.0];

        for bordered_storage in [true, false] {
            let solver =
                MatrixFreeBls::new(tight_gmres()).with_bordered_storage(bordered_storage);
            let sol = solver
                .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
                .unwrap();
            assert!(sol.converged);
            for (a, b) in sol.u.iter().zip(r.iter()) {
                assert!((a - b).abs() < 1e-10);
            }
            assert!((sol.p[0] - 4.0).abs() < 1e-10);
        }
    }

    #[test]
    fn matches_assembly_on_a_coupled_system() {
        let j = from_vec2d(vec![vec![2.0, 0.0], vec![0.0, 3.0]]);
        let cols = [vec![1.0, 1.0]];
        let rows = [vec![1.0, 1.0]];
        let corner = from_vec2d(vec![vec![0.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();
        let r = [3.0, 4.0];
        let s = [2.0];

        let reference = MatrixBls::new(DenseLuSolver)
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();

        for bordered_storage in [true, false] {
            let solver =
                MatrixFreeBls::new(tight_gmres()).with_bordered_storage(bordered_storage);
            let sol = solver
                .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
                .unwrap();
            assert!(sol.converged);
            for (a, b) in sol.u.iter().zip(reference.u.iter()) {
                assert!((a - b).abs_val() < 1e-10, "representation {bordered_storage}");
            }
            assert!((sol.p[0] - reference.p[0]).abs_val() < 1e-10);
        }
    }

    #[test]
    fn representations_agree_with_each_other() {
        let j = from_vec2d(vec![
            vec![4.0, 1.0, 0.0],
            vec![1.0, 5.0, 2.0],
            vec![0.0, 2.0, 6.0],
        ]);
        let cols = [vec![1.0, -0.5, 0.25]];
        let rows = [vec![0.5, 0.5, 0.5]];
        let corner = from_vec2d(vec![vec![2.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, Some(0.25)).unwrap();
        let r = [1.0, 0.0, -1.0];
        let s = [0.5];

        let structured = MatrixFreeBls::new(tight_gmres())
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();
        let flat = MatrixFreeBls::new(tight_gmres())
            .with_bordered_storage(false)
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();

        for (a, b) in structured.u.iter().zip(flat.u.iter()) {
            assert!((a - b).abs_val() < 1e-10);
        }
        assert!((structured.p[0] - flat.p[0]).abs_val() < 1e-10);
    }

    #[test]
    fn agrees_with_elimination_on_a_block_system() {
        let j = from_vec2d(vec![vec![3.0, 0.5], vec![0.5, 4.0]]);
        let cols = [vec![1.0, 0.0], vec![0.0, 1.0]];
        let rows = [vec![1.0, 1.0], vec![1.0, -1.0]];
        let corner = from_vec2d(vec![vec![2.0, 0.0], vec![0.0, 2.0]]);
        let sys = Bordered::new(&j, &cols, &rows, &corner, None).unwrap();
        let r = [1.0, 2.0];
        let s = [0.5, 0.25];

        let eliminated = BorderingBls::new(DenseLuSolver)
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();
        let wrapped = MatrixFreeBls::new(tight_gmres())
            .solve_bordered(&sys, &r, &s, &BorderScaling::default(), &euclidean)
            .unwrap();

        for (a, b) in wrapped.u.iter().zip(eliminated.u.iter()) {
            assert!((a - b).abs_val() < 1e-9);
        }
        for (a, b) in wrapped.p.iter().zip(eliminated.p.iter()) {
            assert!((a - b).abs_val() < 1e-9);
        }
    }
}
