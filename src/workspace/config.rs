//! Workspace configuration

/// Default number of scratch tensors kept by the buffer pool
pub const DEFAULT_BUFFER_CAPACITY: usize = 2;

/// Default number of outer blocks before CPU kernels go parallel
pub const DEFAULT_PARALLEL_MIN_OUTER: usize = 64;

/// Configuration for a [`Workspace`](super::Workspace)
///
/// # Example
///
/// ```ignore
/// let config = WorkspaceConfig::default()
///     .with_buffer_capacity(4)
///     .with_share_grads(false);
/// let ws = Workspace::<CpuRuntime>::with_config(&device, config);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Maximum number of tensors held by the buffer pool
    pub buffer_capacity: usize,
    /// Default for gradient operators' `share_grads` argument: whether they
    /// borrow pooled scratch tensors for outputs and release consumed
    /// gradients to the pool
    pub share_grads: bool,
    /// Outer blocks a gather or scatter-add needs before a backend splits it
    /// across threads
    pub parallel_min_outer: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            share_grads: true,
            parallel_min_outer: DEFAULT_PARALLEL_MIN_OUTER,
        }
    }
}

impl WorkspaceConfig {
    /// Set the buffer pool capacity
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the default gradient-sharing behaviour
    pub fn with_share_grads(mut self, share: bool) -> Self {
        self.share_grads = share;
        self
    }

    /// Set the parallel kernel threshold
    pub fn with_parallel_min_outer(mut self, min_outer: usize) -> Self {
        self.parallel_min_outer = min_outer;
        self
    }
}
