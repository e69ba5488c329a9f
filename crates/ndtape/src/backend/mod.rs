//! Numeric backend abstraction.
//!
//! The backward pass needs two capabilities from the numeric layer: a
//! constant-fill factory for the seed gradient and an elementwise `add`
//! for summing fan-out contributions. Both run off-tape.
//!
//! # Backends
//!
//! - `GenericBackend`: Naive loop-based implementation (always available)

mod generic;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

pub use generic::GenericBackend;

/// Numeric capabilities consumed by gradient accumulation.
pub trait Backend<T: Scalar> {
    /// Element-wise `a + b`. Never recorded on a tape.
    fn add(&self, a: &DenseTensor<T>, b: &DenseTensor<T>) -> Result<DenseTensor<T>, TensorError>;

    /// Tensor of the given shape with every element set to `value`.
    fn fill(&self, shape: &[usize], value: T) -> DenseTensor<T>;
}

impl<T: Scalar, B: Backend<T> + ?Sized> Backend<T> for &B {
    fn add(&self, a: &DenseTensor<T>, b: &DenseTensor<T>) -> Result<DenseTensor<T>, TensorError> {
        (**self).add(a, b)
    }

    fn fill(&self, shape: &[usize], value: T) -> DenseTensor<T> {
        (**self).fill(shape, value)
    }
}
