//! CPU runtime implementation
//!
//! The CPU runtime keeps tensor memory on the host heap and runs kernels
//! synchronously on the calling thread. With the `rayon` feature, gather and
//! scatter-add kernels split work across outer blocks once there are enough
//! of them to pay for the fan-out.

mod context;
mod device;
pub(crate) mod kernels;
mod runtime;

pub use crate::tensor::Tensor;
pub use context::CpuContext;
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
