//! Tracked tensor operations with automatic differentiation.
//!
//! Each operation computes its result with the plain kernels in
//! [`crate::operations`] and records a node carrying its local gradient.

mod elementwise;
mod reduce;

pub use elementwise::{tracked_add, tracked_mul, tracked_neg, tracked_scale, tracked_sub};
pub use reduce::tracked_sum;
