//! CPU execution context and kernel dispatch

use super::device::CpuDevice;
use super::kernels;
use super::runtime::CpuRuntime;
use crate::error::Result;
use crate::runtime::{AtDims, AtKernel, DeviceContext};
use crate::workspace::DEFAULT_PARALLEL_MIN_OUTER;

/// CPU context for kernel execution
#[derive(Clone, Debug)]
pub struct CpuContext {
    pub(crate) device: CpuDevice,
    parallel_min_outer: usize,
}

impl CpuContext {
    /// Create a new CPU context
    pub fn new(device: CpuDevice) -> Self {
        Self {
            device,
            parallel_min_outer: DEFAULT_PARALLEL_MIN_OUTER,
        }
    }

    /// Set how many outer blocks a kernel needs before it splits work
    /// across the rayon pool. Values below 1 are clamped to 1.
    pub fn with_parallel_min_outer(mut self, min_outer: usize) -> Self {
        self.parallel_min_outer = min_outer.max(1);
        self
    }

    /// Outer-block threshold for parallel kernels
    #[inline]
    pub fn parallel_min_outer(&self) -> usize {
        self.parallel_min_outer
    }

    #[inline]
    fn go_parallel(&self, dims: &AtDims) -> bool {
        cfg!(feature = "rayon") && dims.outer_dim >= self.parallel_min_outer
    }
}

impl DeviceContext<CpuRuntime> for CpuContext {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // CPU kernels are synchronous, nothing to do
    }
}

macro_rules! impl_at_kernel {
    ($($ty:ty),*) => {
        $(
            impl AtKernel<$ty> for CpuContext {
                fn canonical_axis(&self, dim: usize, indices: &mut [$ty]) {
                    kernels::canonical_axis_kernel(dim, indices);
                }

                fn at(&self, dims: AtDims, indices: &[$ty], x: &[$ty], y: &mut [$ty]) -> Result<()> {
                    kernels::at_kernel(dims, indices, x, y, self.go_parallel(&dims))
                }

                fn at_grad(
                    &self,
                    dims: AtDims,
                    indices: &[$ty],
                    dy: &[$ty],
                    dx: &mut [$ty],
                ) -> Result<()> {
                    kernels::at_grad_kernel(dims, indices, dy, dx, self.go_parallel(&dims))
                }

                fn set(&self, value: $ty, x: &mut [$ty]) {
                    kernels::set_kernel(value, x);
                }
            }
        )*
    };
}

impl_at_kernel!(f32, f64);
