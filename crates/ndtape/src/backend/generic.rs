//! Generic (naive loop-based) backend implementation.

use crate::backend::Backend;
use crate::error::TensorError;
use crate::operations;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Generic backend using naive loop-based implementations.
///
/// This backend is always available and serves as a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericBackend;

impl<T: Scalar> Backend<T> for GenericBackend {
    fn add(&self, a: &DenseTensor<T>, b: &DenseTensor<T>) -> Result<DenseTensor<T>, TensorError> {
        operations::add(a, b)
    }

    fn fill(&self, shape: &[usize], value: T) -> DenseTensor<T> {
        DenseTensor::full(shape, value)
    }
}
