//! Storage: device memory backing a tensor

use crate::dtype::{DType, Element};
use crate::runtime::Runtime;

/// Size of one storage word in bytes
const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Storage for tensor data on a device
///
/// Memory is a block of 8-byte words, so any [`Element`] (alignment <= 8) can
/// be viewed through bytemuck without alignment faults. Storage is owned by
/// exactly one tensor; growing it is the only reallocation path, so a tensor
/// that is reshaped to a smaller or equal size keeps its allocation.
pub struct Storage<R: Runtime> {
    words: Vec<u64>,
    device: R::Device,
}

impl<R: Runtime> Storage<R> {
    /// Create empty storage (no allocation)
    pub fn empty(device: &R::Device) -> Self {
        Self {
            words: Vec::new(),
            device: device.clone(),
        }
    }

    /// Create zeroed storage able to hold `len` elements of `dtype`
    pub fn new(len: usize, dtype: DType, device: &R::Device) -> Self {
        let mut storage = Self::empty(device);
        storage.ensure_capacity(len * dtype.size_in_bytes());
        storage
    }

    /// Create storage from existing data with inferred dtype
    pub fn from_slice<T: Element>(data: &[T], device: &R::Device) -> Self {
        let mut storage = Self::new(data.len(), T::DTYPE, device);
        storage.as_mut_slice::<T>(data.len()).copy_from_slice(data);
        storage
    }

    /// Grow to at least `size_bytes`. New memory is zeroed.
    ///
    /// Returns true if a reallocation happened.
    pub fn ensure_capacity(&mut self, size_bytes: usize) -> bool {
        let words = size_bytes.div_ceil(WORD_BYTES);
        if words <= self.words.len() {
            return false;
        }
        self.words.resize(words, 0);
        true
    }

    /// Capacity in bytes
    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.device
    }

    /// Raw address of the allocation, used to observe buffer reuse
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.words.as_ptr() as u64
    }

    /// View the first `len` elements as `T`
    ///
    /// Callers guarantee `len * size_of::<T>() <= capacity_bytes()`.
    pub(crate) fn as_slice<T: Element>(&self, len: usize) -> &[T] {
        &bytemuck::cast_slice::<u64, T>(&self.words)[..len]
    }

    /// Mutable view of the first `len` elements as `T`
    pub(crate) fn as_mut_slice<T: Element>(&mut self, len: usize) -> &mut [T] {
        &mut bytemuck::cast_slice_mut::<u64, T>(&mut self.words)[..len]
    }
}

impl<R: Runtime> Clone for Storage<R> {
    /// Deep copy; storage is never shared between tensors
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            device: self.device.clone(),
        }
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.ptr()))
            .field("bytes", &self.capacity_bytes())
            .finish()
    }
}
