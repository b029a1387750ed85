//! Core Tensor type

use super::{Shape, Storage, TensorId};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// N-dimensional array stored on a compute device
///
/// A `Tensor` consists of:
/// - **Storage**: device memory, owned exclusively by this tensor
/// - **Shape**: contiguous row-major dimensions
/// - **DType**: element type tag (determined at runtime)
///
/// Tensors live in a [`Workspace`](crate::workspace::Workspace). Operators
/// resize their outputs with [`reshape`](Self::reshape) and then fill them
/// through [`mutable_data`](Self::mutable_data); neither call shrinks the
/// allocation, so an output reused across runs keeps its memory.
///
/// # Example
///
/// ```ignore
/// use opgraph::prelude::*;
///
/// let device = CpuDevice::new();
/// let x = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
/// assert_eq!(x.count_range(0, 1), 2);
/// ```
pub struct Tensor<R: Runtime> {
    id: TensorId,
    shape: Shape,
    dtype: DType,
    storage: Storage<R>,
}

impl<R: Runtime> Tensor<R> {
    /// Create an unsized tensor with no memory attached
    ///
    /// The shape is `[0]` until the first `reshape`.
    pub fn new(device: &R::Device) -> Self {
        Self {
            id: TensorId::new(),
            shape: Shape::from([0]),
            dtype: DType::default(),
            storage: Storage::empty(device),
        }
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        match Self::try_from_slice(data, shape, device) {
            Ok(tensor) => tensor,
            Err(err) => panic!("Tensor::from_slice failed: {err}"),
        }
    }

    /// Create a tensor from a slice of data (fallible version)
    pub fn try_from_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        Ok(Self {
            id: TensorId::new(),
            shape: Shape::from(shape),
            dtype: T::DTYPE,
            storage: Storage::from_slice(data, device),
        })
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        let shape = Shape::from(shape);
        let storage = Storage::new(shape.numel(), dtype, device);
        Self {
            id: TensorId::new(),
            shape,
            dtype,
            storage,
        }
    }

    /// Create a tensor filled with `value`
    pub fn full<T: Element>(shape: &[usize], value: T, device: &R::Device) -> Self {
        let mut tensor = Self::zeros(shape, T::DTYPE, device);
        tensor.mutable_data::<T>().fill(value);
        tensor
    }

    /// Get the unique tensor ID
    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the shape as an owned `Shape`
    #[inline]
    pub fn dims(&self) -> Shape {
        self.shape.clone()
    }

    /// Size of dimension `axis`
    ///
    /// # Panics
    ///
    /// Panics if `axis >= ndim()`; operators validate axes before calling.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn count(&self) -> usize {
        self.shape.numel()
    }

    /// Product of the dimensions in `[start, end)`
    #[inline]
    pub fn count_range(&self, start: usize, end: usize) -> usize {
        self.shape.count_range(start, end)
    }

    /// Product of the dimensions from `start` to the last one
    #[inline]
    pub fn count_from(&self, start: usize) -> usize {
        self.shape.count_range(start, self.shape.ndim())
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Whether elements are of type `T`
    #[inline]
    pub fn is_type<T: Element>(&self) -> bool {
        self.dtype == T::DTYPE
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Get the underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Resize to `dims`, keeping the current allocation when it is big enough
    pub fn reshape(&mut self, dims: &[usize]) {
        self.shape = Shape::from(dims);
        self.storage
            .ensure_capacity(self.shape.numel() * self.dtype.size_in_bytes());
    }

    /// Resize to the shape of `other`
    pub fn reshape_like(&mut self, other: &Tensor<R>) {
        self.reshape(other.shape());
    }

    /// Read-only typed view of the elements
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        if !self.is_type::<T>() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype,
                rhs: T::DTYPE,
            });
        }
        Ok(self.storage.as_slice::<T>(self.count()))
    }

    /// Mutable typed view of the elements
    ///
    /// Retags the tensor as `T` if needed and grows the storage to fit.
    /// Contents carried over from a different dtype are unspecified.
    pub fn mutable_data<T: Element>(&mut self) -> &mut [T] {
        let len = self.count();
        self.dtype = T::DTYPE;
        self.storage.ensure_capacity(len * T::DTYPE.size_in_bytes());
        self.storage.as_mut_slice::<T>(len)
    }

    /// Copy the elements to a host vector
    ///
    /// # Panics
    ///
    /// Panics if the tensor does not hold `T` elements.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        match self.data::<T>() {
            Ok(data) => data.to_vec(),
            Err(err) => panic!("Tensor::to_vec failed: {err}"),
        }
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    /// Deep copy with a fresh ID
    fn clone(&self) -> Self {
        Self {
            id: TensorId::new(),
            shape: self.shape.clone(),
            dtype: self.dtype,
            storage: self.storage.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("storage", &self.storage)
            .finish()
    }
}
