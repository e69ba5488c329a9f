//! Scalar trait for tensor element types.

use faer_traits::ComplexField;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

pub use faer::c64;

/// Trait for element types a tape can differentiate.
///
/// Wraps faer's `ComplexField` with the arithmetic the gradient kernels
/// need. Complex gradients follow the conjugate convention, so `f64` and
/// `c64` share one set of local gradient rules.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;
}

impl Scalar for f64 {
    fn one() -> Self {
        1.0
    }
}

impl Scalar for c64 {
    fn one() -> Self {
        c64::new(1.0, 0.0)
    }
}
