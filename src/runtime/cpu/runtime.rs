//! CPU runtime implementation

use super::context::CpuContext;
use super::device::CpuDevice;
use crate::runtime::Runtime;
use crate::workspace::WorkspaceConfig;

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Context = CpuContext;

    fn name() -> &'static str {
        "cpu"
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }

    fn default_context(device: &Self::Device) -> Self::Context {
        CpuContext::new(device.clone())
    }

    fn configured_context(device: &Self::Device, config: &WorkspaceConfig) -> Self::Context {
        CpuContext::new(device.clone()).with_parallel_min_outer(config.parallel_min_outer)
    }
}
