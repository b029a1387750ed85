//! Scratch-buffer pool

use crate::runtime::Runtime;
use crate::tensor::Tensor;
use log::trace;

/// Bounded pool of reusable scratch tensors
///
/// Ownership moves in both directions: [`acquire`](Self::acquire) hands a
/// tensor out, [`release`](Self::release) takes one back. Once the pool holds
/// `capacity` tensors, further releases drop the tensor and free its memory.
pub struct BufferPool<R: Runtime> {
    free: Vec<Tensor<R>>,
    capacity: usize,
}

impl<R: Runtime> BufferPool<R> {
    /// Create an empty pool that keeps at most `capacity` tensors
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take a pooled tensor, most recently released first
    pub fn acquire(&mut self) -> Option<Tensor<R>> {
        let buffer = self.free.pop();
        if let Some(buf) = &buffer {
            trace!("buffer pool: acquire {} ({} left)", buf.id(), self.free.len());
        }
        buffer
    }

    /// Return a tensor to the pool
    pub fn release(&mut self, tensor: Tensor<R>) {
        if self.free.len() >= self.capacity {
            trace!("buffer pool: full, dropping {}", tensor.id());
            return;
        }
        trace!("buffer pool: release {}", tensor.id());
        self.free.push(tensor);
    }

    /// Number of tensors currently pooled
    #[inline]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Whether the pool is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Drop every pooled tensor
    pub fn clear(&mut self) {
        trace!("buffer pool: clear {} tensors", self.free.len());
        self.free.clear();
    }
}
