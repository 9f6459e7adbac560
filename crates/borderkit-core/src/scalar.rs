//! Scalar abstraction shared by the dense kernels and the bordered solvers.
//!
//! Every solver in this workspace is generic over a single scalar type fixed
//! per call; the trait below covers the real and complex floating point types
//! that continuation problems use in practice.

use num_complex::{Complex32, Complex64};
use num_traits::{Float, One, Zero};

/// Scalar type usable in matrices, vectors and solver arithmetic.
pub trait Scalar:
    Clone
    + Copy
    + PartialEq
    + Zero
    + One
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
    + std::fmt::Debug
    + Default
    + Send
    + Sync
    + 'static
{
    /// Complex conjugate of the value.
    fn conj(self) -> Self;

    /// Square of the absolute value (for complex numbers, |z|^2).
    fn abs_sq(self) -> f64;

    /// Absolute value as f64.
    fn abs_val(self) -> f64 {
        self.abs_sq().sqrt()
    }

    /// Create from f64 value.
    fn from_f64(val: f64) -> Self;

    /// Check if value is NaN.
    fn is_nan(self) -> bool;

    /// Check if value is finite (neither NaN nor infinite).
    fn is_finite(self) -> bool;

    /// Breakdown guard for divisions inside iterative kernels.
    fn epsilon() -> f64 {
        1e-30
    }
}

impl Scalar for f64 {
    #[inline]
    fn conj(self) -> Self {
        self
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        self * self
    }

    #[inline]
    fn abs_val(self) -> f64 {
        Float::abs(self)
    }

    #[inline]
    fn from_f64(val: f64) -> Self {
        val
    }

    #[inline]
    fn is_nan(self) -> bool {
        Float::is_nan(self)
    }

    #[inline]
    fn is_finite(self) -> bool {
        Float::is_finite(self)
    }
}

impl Scalar for f32 {
    #[inline]
    fn conj(self) -> Self {
        self
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        (self * self) as f64
    }

    #[inline]
    fn abs_val(self) -> f64 {
        Float::abs(self) as f64
    }

    #[inline]
    fn from_f64(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn is_nan(self) -> bool {
        Float::is_nan(self)
    }

    #[inline]
    fn is_finite(self) -> bool {
        Float::is_finite(self)
    }
}

impl Scalar for Complex64 {
    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        self.norm_sqr()
    }

    #[inline]
    fn abs_val(self) -> f64 {
        self.norm()
    }

    #[inline]
    fn from_f64(val: f64) -> Self {
        Complex64::new(val, 0.0)
    }

    #[inline]
    fn is_nan(self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    #[inline]
    fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

impl Scalar for Complex32 {
    #[inline]
    fn conj(self) -> Self {
        Complex32::conj(&self)
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        self.norm_sqr() as f64
    }

    #[inline]
    fn abs_val(self) -> f64 {
        self.norm() as f64
    }

    #[inline]
    fn from_f64(val: f64) -> Self {
        Complex32::new(val as f32, 0.0)
    }

    #[inline]
    fn is_nan(self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    #[inline]
    fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

/// Macro to generate f64 and Complex64 test variants from a generic test function.
///
/// # Example
///
/// ```ignore
/// fn solve_identity_generic<T: Scalar>() {
///     // test implementation
/// }
///
/// borderkit_core::scalar_tests!(solve_identity, solve_identity_generic);
/// // Generates:
/// // #[test] fn solve_identity_f64() { solve_identity_generic::<f64>(); }
/// // #[test] fn solve_identity_c64() { solve_identity_generic::<Complex64>(); }
/// ```
#[macro_export]
macro_rules! scalar_tests {
    ($name:ident, $test_fn:ident) => {
        paste::paste! {
            #[test]
            fn [<$name _f64>]() {
                $test_fn::<f64>();
            }

            #[test]
            fn [<$name _c64>]() {
                $test_fn::<num_complex::Complex64>();
            }
        }
    };
}
