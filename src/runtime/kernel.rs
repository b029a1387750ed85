//! Compile-time enforced typed kernel traits for the gather family
//!
//! `AtKernel<T>` MUST be implemented by a device context for each dtype the
//! backend supports. An operator that dispatches `DType::F32` requires
//! `R::Context: AtKernel<f32>`; if the backend is missing that impl, the
//! operator cannot be deployed for it.
//!
//! ```text
//! AtOp::run_on_device
//!     match dtype { F32 => run_with_type::<f32>() }
//!                  │
//!                  ▼
//!        AtKernel<f32> for R::Context
//!                  │
//!                  ▼
//!  backend-specific loops (CPU: rayon over outer blocks)
//! ```

use crate::dtype::Element;
use crate::error::Result;

/// Flattened geometry of a gather along one axis
///
/// A tensor of shape `[d0, .., d(a-1), d(a), d(a+1), .., dn]` gathered along
/// axis `a` is viewed as `[outer_dim, x_slice_dim, inner_dim]`; the gathered
/// result is `[outer_dim, y_slice_dim, inner_dim]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AtDims {
    /// Product of the dimensions before the axis
    pub outer_dim: usize,
    /// Product of the dimensions after the axis
    pub inner_dim: usize,
    /// Source size along the axis
    pub x_slice_dim: usize,
    /// Number of indices (output size along the axis)
    pub y_slice_dim: usize,
}

impl AtDims {
    /// Element count of the source / input-gradient tensor
    #[inline]
    pub fn x_count(&self) -> usize {
        self.outer_dim * self.x_slice_dim * self.inner_dim
    }

    /// Element count of the gathered output / output-gradient tensor
    #[inline]
    pub fn y_count(&self) -> usize {
        self.outer_dim * self.y_slice_dim * self.inner_dim
    }
}

/// Gather / scatter-add kernels for element type `T`
///
/// Index lists are stored with the same element type as the data.
pub trait AtKernel<T: Element> {
    /// Wrap negative indices in place: `idx < 0 => idx + dim`
    ///
    /// Values already in `[0, dim)` are left untouched, so repeated calls are
    /// idempotent.
    fn canonical_axis(&self, dim: usize, indices: &mut [T]);

    /// Gather: `y[o, j, i] = x[o, indices[j], i]`
    fn at(&self, dims: AtDims, indices: &[T], x: &[T], y: &mut [T]) -> Result<()>;

    /// Scatter-add: `dx[o, indices[j], i] += dy[o, j, i]`
    ///
    /// Duplicate indices accumulate. `dx` is not cleared.
    fn at_grad(&self, dims: AtDims, indices: &[T], dy: &[T], dx: &mut [T]) -> Result<()>;

    /// Fill `x` with `value`
    fn set(&self, value: T, x: &mut [T]);
}
