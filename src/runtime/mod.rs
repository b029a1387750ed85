//! Runtime backends for operator execution
//!
//! This module defines the `Runtime` trait and the CPU implementation.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (identifies a specific GPU/CPU)
//! └── Context (executes kernels, owns stream/queue ordering)
//!       └── AtKernel<T> (one impl per supported element type)
//! ```
//!
//! Operators are generic over `R: Runtime` and require
//! `R::Context: AtKernel<T>` for each element type they dispatch to, so a
//! backend that lacks a kernel for a dtype fails to compile instead of
//! failing at run time.

pub mod kernel;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use kernel::{AtDims, AtKernel};

use crate::workspace::WorkspaceConfig;

/// Core trait for compute backends
///
/// `Runtime` abstracts over different compute devices. It uses static
/// dispatch via generics; operators are instantiated once per runtime.
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: Device;

    /// Execution context for kernels on one device
    type Context: DeviceContext<Self>;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default execution context for a device
    fn default_context(device: &Self::Device) -> Self::Context;

    /// Execution context for a device, tuned by a workspace configuration
    ///
    /// Backends without tunables keep the default context.
    fn configured_context(device: &Self::Device, _config: &WorkspaceConfig) -> Self::Context {
        Self::default_context(device)
    }
}

/// Trait for device identification
pub trait Device: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Trait for kernel execution contexts
///
/// On synchronous devices kernels complete before returning; on queued
/// devices they are ordered by the context's own stream and `synchronize`
/// waits for them.
pub trait DeviceContext<R: Runtime>: Clone + Send + Sync {
    /// Get the device this context operates on
    fn device(&self) -> &R::Device;

    /// Wait for all pending kernels to complete
    fn synchronize(&self);
}
