//! Tracked element-wise operations with backward passes.
//!
//! Complex gradients use the conjugate convention: for `y = a * b` the
//! contribution to `a` is `dy * conj(b)`.

use crate::autodiff::saved_tensor::SavedTensor;
use crate::autodiff::tape::{GradFn, InputGrads, Tape};
use crate::autodiff::tensor::TrackedTensor;
use crate::error::{TapeError, TensorError};
use crate::operations::{add, conj, mul, neg, scale, sub};
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use faer_traits::math_utils::conj as conj_scalar;

/// Backward function for `a + b`.
#[derive(Debug)]
struct AddBackward;

impl<T: Scalar> GradFn<T> for AddBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        Ok(vec![("a", grad_output.clone()), ("b", grad_output.clone())])
    }
}

/// Backward function for `a - b`.
#[derive(Debug)]
struct SubBackward;

impl<T: Scalar> GradFn<T> for SubBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        Ok(vec![("a", grad_output.clone()), ("b", neg(grad_output))])
    }
}

/// Backward function for the element-wise product.
///
/// Saves both operands from the forward pass.
#[derive(Debug)]
struct MulBackward<T: Scalar> {
    saved_a: SavedTensor<T>,
    saved_b: SavedTensor<T>,
}

impl<T: Scalar> GradFn<T> for MulBackward<T> {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        let grad_a = mul(grad_output, &conj(self.saved_b.get()))?;
        let grad_b = mul(grad_output, &conj(self.saved_a.get()))?;
        Ok(vec![("a", grad_a), ("b", grad_b)])
    }
}

/// Backward function for negation.
#[derive(Debug)]
struct NegBackward;

impl<T: Scalar> GradFn<T> for NegBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        Ok(vec![("x", neg(grad_output))])
    }
}

/// Backward function for multiplication by a constant.
#[derive(Debug)]
struct ScaleBackward<T: Scalar> {
    alpha: T,
}

impl<T: Scalar> GradFn<T> for ScaleBackward<T> {
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
        _output: &DenseTensor<T>,
    ) -> Result<InputGrads<T>, TensorError> {
        Ok(vec![("x", scale(grad_output, conj_scalar(&self.alpha)))])
    }
}

/// Tracked element-wise sum `a + b`.
///
/// # Errors
///
/// Fails with a `TensorError` if the shapes differ.
pub fn tracked_add<T: Scalar>(
    tape: &mut Tape<T>,
    a: &TrackedTensor<T>,
    b: &TrackedTensor<T>,
) -> Result<TrackedTensor<T>, TapeError> {
    let result = add(a.tensor(), b.tensor())?;
    tape.record(
        "add",
        [("a", a.id()), ("b", b.id())],
        result,
        Some(Box::new(AddBackward)),
    )
}

/// Tracked element-wise difference `a - b`.
pub fn tracked_sub<T: Scalar>(
    tape: &mut Tape<T>,
    a: &TrackedTensor<T>,
    b: &TrackedTensor<T>,
) -> Result<TrackedTensor<T>, TapeError> {
    let result = sub(a.tensor(), b.tensor())?;
    tape.record(
        "sub",
        [("a", a.id()), ("b", b.id())],
        result,
        Some(Box::new(SubBackward)),
    )
}

/// Tracked element-wise product `a * b`.
///
/// # Example
///
/// ```
/// use ndtape::DenseTensor;
/// use ndtape::autodiff::{Tape, TrackedTensor, tracked_mul};
///
/// let mut tape = Tape::new();
/// let a = TrackedTensor::new(DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
/// let b = TrackedTensor::new(DenseTensor::from_vec(vec![3.0, 4.0], &[2]).unwrap());
/// let c = tracked_mul(&mut tape, &a, &b).unwrap();
///
/// assert_eq!(c.data(), &[3.0, 8.0]);
/// assert_eq!(tape.lookup_producer(c.id()).unwrap().name(), "mul");
/// ```
pub fn tracked_mul<T: Scalar>(
    tape: &mut Tape<T>,
    a: &TrackedTensor<T>,
    b: &TrackedTensor<T>,
) -> Result<TrackedTensor<T>, TapeError> {
    let result = mul(a.tensor(), b.tensor())?;
    let backward = MulBackward {
        saved_a: a.saved(),
        saved_b: b.saved(),
    };
    tape.record(
        "mul",
        [("a", a.id()), ("b", b.id())],
        result,
        Some(Box::new(backward)),
    )
}

/// Tracked negation `-x`.
pub fn tracked_neg<T: Scalar>(
    tape: &mut Tape<T>,
    x: &TrackedTensor<T>,
) -> Result<TrackedTensor<T>, TapeError> {
    tape.record(
        "neg",
        [("x", x.id())],
        neg(x.tensor()),
        Some(Box::new(NegBackward)),
    )
}

/// Tracked multiplication by a constant `alpha * x`.
pub fn tracked_scale<T: Scalar>(
    tape: &mut Tape<T>,
    x: &TrackedTensor<T>,
    alpha: T,
) -> Result<TrackedTensor<T>, TapeError> {
    tape.record(
        "scale",
        [("x", x.id())],
        scale(x.tensor(), alpha),
        Some(Box::new(ScaleBackward { alpha })),
    )
}
