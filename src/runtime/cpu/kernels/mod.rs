//! CPU kernel implementations
//!
//! Kernels are generic over `T: Element` and operate on host slices.

pub mod index;
pub mod memory;

// Re-export all kernel functions for convenient access
pub use index::{at_grad_kernel, at_kernel, canonical_axis_kernel};
pub use memory::set_kernel;
