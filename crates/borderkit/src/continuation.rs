//! Adapter for pseudo-arclength continuation.
//!
//! The Newton corrector of an arclength continuation produces exactly one
//! bordered system per step: the border row is the branch tangent, the
//! corner is its parameter component, and the arclength weight `theta`
//! splits into the scaling pair `xi_u = theta`, `xi_p = 1 - theta`. This
//! module forwards that calling shape to any back-end.

use borderkit_core::dense::from_vec2d;
use borderkit_core::scalar::Scalar;

use crate::bordered::{Bordered, BorderScaling, BorderedSolution, BorderedSolver};
use crate::error::Result;
use crate::linear::LinearOp;

/// Direction along the solution branch: a state part and the parameter
/// component.
#[derive(Debug, Clone)]
pub struct Tangent<T> {
    /// State part of the tangent.
    pub u: Vec<T>,
    /// Parameter component of the tangent.
    pub p: T,
}

impl<T: Scalar> Tangent<T> {
    /// Pair a state direction with its parameter component.
    pub fn new(u: Vec<T>, p: T) -> Self {
        Self { u, p }
    }
}

/// Arclength weight together with the inner product it weights.
#[derive(Debug, Clone)]
pub struct ArclengthWeight<D> {
    /// The arclength weighting parameter `theta`.
    pub theta: f64,
    /// Inner product on the state space; Euclidean unless the
    /// discretisation supplies its own quadrature.
    pub dotp: D,
}

impl<D> ArclengthWeight<D> {
    /// Weighting with the given `theta` and inner product.
    pub fn new(theta: f64, dotp: D) -> Self {
        Self { theta, dotp }
    }
}

/// Solve the continuation corrector system
///
/// ```text
/// (shift I + J) du + dp col                            = r
/// theta dotp(tangent.u, du) + (1 - theta) tangent.p dp = s
/// ```
///
/// with any bordered back-end.
#[allow(clippy::too_many_arguments)]
pub fn solve_arclength<T, Op, B, D>(
    bls: &B,
    tangent: &Tangent<T>,
    weight: &ArclengthWeight<D>,
    op: &Op,
    col: &[T],
    r: &[T],
    s: T,
    shift: Option<T>,
) -> Result<BorderedSolution<T>>
where
    T: Scalar,
    Op: LinearOp<T>,
    B: BorderedSolver<T, Op>,
    D: Fn(&[T], &[T]) -> T,
{
    let cols = [col.to_vec()];
    let rows = [tangent.u.clone()];
    let corner = from_vec2d(vec![vec![tangent.p]]);
    let sys = Bordered::new(op, &cols, &rows, &corner, shift)?;
    bls.solve_bordered(
        &sys,
        r,
        &[s],
        &BorderScaling::arclength(weight.theta),
        &weight.dotp,
    )
}
