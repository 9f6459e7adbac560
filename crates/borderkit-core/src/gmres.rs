//! Restarted GMRES over any [`VectorSpace`] representation.
//!
//! The operator is supplied as a closure, so the same solver runs against a
//! stored matrix, a matrix-free map, or the enlarged operator of a bordered
//! system. Both the flat and the composite vector representations from
//! [`crate::vector`] satisfy the trait bound and work unchanged.

use crate::error::{CoreError, Result};
use crate::scalar::Scalar;
use crate::vector::VectorSpace;

/// Options for the GMRES solver.
#[derive(Debug, Clone)]
pub struct GmresOptions {
    /// Maximum number of iterations per restart cycle.
    /// Default: 100
    pub max_iter: usize,

    /// Convergence tolerance on the relative residual norm
    /// `||r|| / ||b||`. Default: 1e-10
    pub rtol: f64,

    /// Absolute residual floor: the solve also stops once
    /// `||r|| <= abs_tol`, whatever `||b||` is. Default: 0 (disabled)
    pub abs_tol: f64,

    /// Maximum number of restarts. Default: 10
    pub max_restarts: usize,

    /// Whether to print convergence information. Default: false
    pub verbose: bool,
}

impl Default for GmresOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            rtol: 1e-10,
            abs_tol: 0.0,
            max_restarts: 10,
            verbose: false,
        }
    }
}

impl GmresOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum iterations per restart cycle.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative convergence tolerance.
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Set the absolute residual floor.
    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    /// Set the maximum number of restarts.
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Enable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Result of a GMRES solve.
#[derive(Debug, Clone)]
pub struct GmresOutcome<V> {
    /// The solution vector.
    pub solution: V,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Final relative residual norm.
    pub residual_norm: f64,

    /// Whether the solver converged.
    pub converged: bool,
}

/// Solve `A x = b` with restarted GMRES.
///
/// Builds an orthonormal Krylov basis by Arnoldi with modified Gram-Schmidt
/// and minimises `||b - A x||` over it, tracking the residual through Givens
/// rotations of the Hessenberg matrix.
///
/// `apply_a` applies the linear operator. Non-convergence within the
/// iteration budget is not an error: the outcome carries its best estimate
/// with `converged = false`. An exactly singular projected system is
/// reported as [`CoreError::SingularMatrix`].
pub fn gmres<T, V, F>(apply_a: F, b: &V, x0: &V, options: &GmresOptions) -> Result<GmresOutcome<V>>
where
    T: Scalar,
    V: VectorSpace<T>,
    F: Fn(&V) -> V,
{
    let b_norm = b.norm();
    if b_norm < 1e-15 {
        // b is zero, so x = x0 with zero correction.
        return Ok(GmresOutcome {
            solution: x0.clone(),
            iterations: 0,
            residual_norm: 0.0,
            converged: true,
        });
    }
    let target = (options.rtol * b_norm).max(options.abs_tol);

    let mut x = x0.clone();
    let mut total_iters = 0;

    for restart in 0..options.max_restarts {
        // r = b - A * x
        let ax = apply_a(&x);
        let mut r = b.clone();
        r.axpy_mut(-T::one(), &ax);
        let r_norm = r.norm();

        if options.verbose {
            eprintln!(
                "GMRES restart {}: initial residual = {:.6e}",
                restart,
                r_norm / b_norm
            );
        }

        if r_norm <= target {
            return Ok(GmresOutcome {
                solution: x,
                iterations: total_iters,
                residual_norm: r_norm / b_norm,
                converged: true,
            });
        }

        // Arnoldi with modified Gram-Schmidt.
        let mut v_basis: Vec<V> = Vec::with_capacity(options.max_iter + 1);
        let mut h_cols: Vec<Vec<T>> = Vec::with_capacity(options.max_iter);

        let mut v0 = r;
        v0.scale_mut(T::from_f64(1.0 / r_norm));
        v_basis.push(v0);

        let mut cs: Vec<T> = Vec::with_capacity(options.max_iter);
        let mut sn: Vec<T> = Vec::with_capacity(options.max_iter);
        // Residual carried in the rotated Hessenberg space.
        let mut g: Vec<T> = vec![T::from_f64(r_norm)];

        for j in 0..options.max_iter {
            total_iters += 1;

            let w = apply_a(&v_basis[j]);

            let mut h_col: Vec<T> = Vec::with_capacity(j + 2);
            let mut w_orth = w;
            for v_i in v_basis.iter().take(j + 1) {
                let h_ij = v_i.inner(&w_orth);
                h_col.push(h_ij);
                w_orth.axpy_mut(-h_ij, v_i);
            }

            let h_next = w_orth.norm();
            h_col.push(T::from_f64(h_next));

            // Apply the accumulated rotations to the new column.
            for i in 0..j {
                let (hi, hip1) = apply_rotation(cs[i], sn[i], h_col[i], h_col[i + 1]);
                h_col[i] = hi;
                h_col[i + 1] = hip1;
            }

            // New rotation eliminating the subdiagonal entry.
            let (c_j, s_j) = make_rotation(h_col[j], h_col[j + 1]);
            cs.push(c_j);
            sn.push(s_j);

            let (hj, _) = apply_rotation(c_j, s_j, h_col[j], h_col[j + 1]);
            h_col[j] = hj;
            h_col[j + 1] = T::zero();

            let (gj, gjp1) = apply_rotation(c_j, s_j, g[j], T::zero());
            g[j] = gj;
            let res_norm = gjp1.abs_val();
            g.push(gjp1);

            h_cols.push(h_col);

            if options.verbose {
                eprintln!("GMRES iter {}: residual = {:.6e}", j + 1, res_norm / b_norm);
            }

            if res_norm <= target {
                let y = solve_upper_triangular(&h_cols, &g[..=j])?;
                update_solution(&mut x, &v_basis[..=j], &y);
                return Ok(GmresOutcome {
                    solution: x,
                    iterations: total_iters,
                    residual_norm: res_norm / b_norm,
                    converged: true,
                });
            }

            if h_next > 1e-14 {
                let mut v_next = w_orth;
                v_next.scale_mut(T::from_f64(1.0 / h_next));
                v_basis.push(v_next);
            } else {
                // Lucky breakdown: the Krylov subspace contains the exact
                // solution.
                let y = solve_upper_triangular(&h_cols, &g[..=j])?;
                update_solution(&mut x, &v_basis[..=j], &y);
                let ax_final = apply_a(&x);
                let mut r_final = b.clone();
                r_final.axpy_mut(-T::one(), &ax_final);
                let final_res = r_final.norm();
                return Ok(GmresOutcome {
                    solution: x,
                    iterations: total_iters,
                    residual_norm: final_res / b_norm,
                    converged: final_res <= target,
                });
            }
        }

        // End of the cycle: fold the subspace solution into x and restart.
        let y = solve_upper_triangular(&h_cols, &g[..options.max_iter])?;
        update_solution(&mut x, &v_basis[..options.max_iter], &y);
    }

    let ax_final = apply_a(&x);
    let mut r_final = b.clone();
    r_final.axpy_mut(-T::one(), &ax_final);
    let final_res = r_final.norm();

    Ok(GmresOutcome {
        solution: x,
        iterations: total_iters,
        residual_norm: final_res / b_norm,
        converged: final_res <= target,
    })
}

/// Rotation coefficients `(c, s)` eliminating `b` in the pair `(a, b)`.
fn make_rotation<T: Scalar>(a: T, b: T) -> (T, T) {
    let r = (a.abs_sq() + b.abs_sq()).sqrt();
    if r < 1e-15 {
        (T::one(), T::zero())
    } else {
        let inv = T::from_f64(1.0 / r);
        (a * inv, b * inv)
    }
}

/// Apply the rotation: `(conj(c)*x + conj(s)*y, -s*x + c*y)`.
///
/// Unitary for complex scalars; reduces to the familiar real rotation when
/// the conjugations are trivial.
fn apply_rotation<T: Scalar>(c: T, s: T, x: T, y: T) -> (T, T) {
    (c.conj() * x + s.conj() * y, c * y - s * x)
}

/// Solve the rotated Hessenberg system `R y = g` by back substitution.
///
/// `h_cols[j]` is column `j` of the (rotated, upper triangular) matrix.
fn solve_upper_triangular<T: Scalar>(h_cols: &[Vec<T>], g: &[T]) -> Result<Vec<T>> {
    let n = g.len();
    if n == 0 {
        return Ok(vec![]);
    }

    let mut y = vec![T::zero(); n];
    for i in (0..n).rev() {
        let mut sum = g[i];
        for j in (i + 1)..n {
            sum = sum - h_cols[j][i] * y[j];
        }
        let h_ii = h_cols[i][i];
        if h_ii.abs_val() < 1e-15 {
            return Err(CoreError::SingularMatrix);
        }
        y[i] = sum / h_ii;
    }

    Ok(y)
}

/// `x += sum_i y_i * v_i`
fn update_solution<T: Scalar, V: VectorSpace<T>>(x: &mut V, v_basis: &[V], y: &[T]) {
    for (vi, yi) in v_basis.iter().zip(y.iter()) {
        x.axpy_mut(*yi, vi);
    }
}
