//! Host device for the CPU runtime

use crate::runtime::Device;

/// The host CPU. Every `CpuDevice` has id 0, so all CPU tensors share a device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Handle to the host CPU
    pub fn new() -> Self {
        Self { id: 0 }
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}
