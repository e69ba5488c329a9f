//! Tracked reductions.

use crate::autodiff::tape::{GradFn, InputGrads, Tape};
use crate::autodiff::tensor::TrackedTensor;
use crate::error::{TapeError, TensorError};
use crate::operations::sum;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Backward function for the full sum: broadcasts the scalar gradient
/// back over the input's shape.
#[derive(Debug)]
struct SumBackward {
    input_shape: Vec<usize>,
}

impl<T: Scalar> GradFn<T> for SumBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        if grad_output.len() != 1 {
            return Err(TensorError::ShapeMismatch {
                expected: 1,
                actual: grad_output.len(),
            });
        }
        let g = grad_output.data()[0];
        Ok(vec![("x", DenseTensor::full(&self.input_shape, g))])
    }
}

/// Tracked sum of all elements, producing a rank-0 tensor.
///
/// The usual way to reduce a tensor to a scalar loss.
pub fn tracked_sum<T: Scalar>(
    tape: &mut Tape<T>,
    x: &TrackedTensor<T>,
) -> Result<TrackedTensor<T>, TapeError> {
    let backward = SumBackward {
        input_shape: x.shape().to_vec(),
    };
    tape.record("sum", [("x", x.id())], sum(x.tensor()), Some(Box::new(backward)))
}
