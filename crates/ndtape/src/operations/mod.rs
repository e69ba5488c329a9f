//! Tensor operations.
//!
//! Plain numeric kernels over [`DenseTensor`](crate::DenseTensor). The
//! tracked versions in [`crate::autodiff`] call these for their forward
//! values and local gradients; a backend calls them for gradient
//! accumulation, which must stay off the tape.

mod elementwise;

pub use elementwise::{add, apply, apply_binary, conj, mul, neg, scale, sub, sum};
