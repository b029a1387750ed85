//! Workspace: named tensors, scratch buffers, and operator execution
//!
//! The workspace owns every tensor an operator touches. Operators borrow
//! inputs for the duration of one run, or move a tensor out with
//! [`Workspace::take_tensor`] and put it back with
//! [`Workspace::feed_tensor`] when they need it mutably.
//!
//! Execution is synchronous and single-writer: `run_operator` takes
//! `&mut self`, so no two operators can touch the workspace at once.

mod buffer;
mod config;

pub use buffer::BufferPool;
pub use config::{DEFAULT_BUFFER_CAPACITY, DEFAULT_PARALLEL_MIN_OUTER, WorkspaceConfig};

use crate::error::{Error, Result};
use crate::operator::{Operator, OperatorDef};
use crate::registry::{self, OperatorRegistry};
use crate::runtime::{AtKernel, DeviceContext, Runtime};
use crate::tensor::Tensor;
use log::{debug, error};
use std::collections::HashMap;

/// Tensor store and operator executor for one device
pub struct Workspace<R: Runtime> {
    context: R::Context,
    config: WorkspaceConfig,
    tensors: HashMap<String, Tensor<R>>,
    buffers: BufferPool<R>,
    registry: OperatorRegistry<R>,
}

impl<R: Runtime> Workspace<R>
where
    R::Context: AtKernel<f32>,
{
    /// Create a workspace on `device` with the builtin operators deployed
    pub fn new(device: &R::Device) -> Self {
        Self::with_config(device, WorkspaceConfig::default())
    }

    /// Create a workspace with an explicit configuration
    pub fn with_config(device: &R::Device, config: WorkspaceConfig) -> Self {
        Self::from_parts(
            R::configured_context(device, &config),
            config,
            OperatorRegistry::with_builtin(),
        )
    }
}

impl<R: Runtime> Workspace<R> {
    /// Assemble a workspace from a custom context and registry
    pub fn from_parts(
        context: R::Context,
        config: WorkspaceConfig,
        registry: OperatorRegistry<R>,
    ) -> Self {
        Self {
            context,
            buffers: BufferPool::new(config.buffer_capacity),
            config,
            tensors: HashMap::new(),
            registry,
        }
    }

    /// Device this workspace executes on
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.context.device()
    }

    /// Kernel execution context
    #[inline]
    pub fn context(&self) -> &R::Context {
        &self.context
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Operator constructors deployed on this workspace
    #[inline]
    pub fn registry(&self) -> &OperatorRegistry<R> {
        &self.registry
    }

    /// Mutable access to the operator constructors
    #[inline]
    pub fn registry_mut(&mut self) -> &mut OperatorRegistry<R> {
        &mut self.registry
    }

    // ------------------------------------------------------------------
    // Tensors
    // ------------------------------------------------------------------

    /// Get the tensor called `name`, creating an unsized one if missing
    pub fn create_tensor(&mut self, name: &str) -> &mut Tensor<R> {
        let device = self.context.device();
        self.tensors
            .entry(name.to_string())
            .or_insert_with(|| Tensor::new(device))
    }

    /// Store `tensor` under `name`, replacing any previous tensor
    pub fn feed_tensor(&mut self, name: impl Into<String>, tensor: Tensor<R>) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Borrow the tensor called `name`
    pub fn fetch_tensor(&self, name: &str) -> Result<&Tensor<R>> {
        self.tensors
            .get(name)
            .ok_or_else(|| Error::tensor_not_found(name))
    }

    /// Borrow the tensor called `name`, if present
    pub fn get_tensor(&self, name: &str) -> Option<&Tensor<R>> {
        self.tensors.get(name)
    }

    /// Mutably borrow the tensor called `name`, if present
    pub fn get_tensor_mut(&mut self, name: &str) -> Option<&mut Tensor<R>> {
        self.tensors.get_mut(name)
    }

    /// Whether a tensor called `name` exists
    pub fn has_tensor(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Move the tensor called `name` out of the workspace
    pub fn take_tensor(&mut self, name: &str) -> Result<Tensor<R>> {
        self.tensors
            .remove(name)
            .ok_or_else(|| Error::tensor_not_found(name))
    }

    /// Move the tensor called `name` out, or hand out a fresh unsized one
    pub fn take_or_create(&mut self, name: &str) -> Tensor<R> {
        match self.tensors.remove(name) {
            Some(tensor) => tensor,
            None => Tensor::new(self.context.device()),
        }
    }

    /// Remove the tensor called `name`
    pub fn remove_tensor(&mut self, name: &str) -> Option<Tensor<R>> {
        self.tensors.remove(name)
    }

    /// Names of all stored tensors, sorted
    pub fn tensor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ------------------------------------------------------------------
    // Buffer pool
    // ------------------------------------------------------------------

    /// Acquire a pooled scratch tensor, if one is available
    pub fn get_buffer(&mut self) -> Option<Tensor<R>> {
        self.buffers.acquire()
    }

    /// Give a tensor to the buffer pool
    pub fn release_buffer(&mut self, tensor: Tensor<R>) {
        self.buffers.release(tensor);
    }

    /// Number of pooled scratch tensors
    pub fn num_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Free every pooled scratch tensor, e.g. between training steps
    pub fn clear_buffers(&mut self) {
        self.buffers.clear();
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Validate `def` against its schema and build the operator
    pub fn create_operator(&self, def: &OperatorDef) -> Result<Box<dyn Operator<R>>> {
        if let Some(schema) = registry::schema(&def.op_type) {
            schema.verify(def)?;
        }
        self.registry.create(def, self)
    }

    /// Build and run one operator
    ///
    /// Fatal errors (see [`Error::is_fatal`]) are logged at `error` level and
    /// returned; the caller must treat them as a broken graph and stop.
    pub fn run_operator(&mut self, def: &OperatorDef) -> Result<()> {
        debug!(
            "run {} '{}' on {}: {:?} -> {:?}",
            def.op_type,
            def.name,
            R::name(),
            def.inputs,
            def.outputs
        );
        let result = self
            .create_operator(def)
            .and_then(|mut op| op.run(self));
        if let Err(err) = &result {
            if err.is_fatal() {
                error!("{} '{}' failed: {}", def.op_type, def.name, err);
            }
        }
        result
    }

    /// Run operators in order, stopping at the first error
    pub fn run_operators(&mut self, defs: &[OperatorDef]) -> Result<()> {
        for def in defs {
            self.run_operator(def)?;
        }
        self.context.synchronize();
        Ok(())
    }
}
