//! Tensor types
//!
//! This module provides the core `Tensor` type, an n-dimensional contiguous
//! array stored on a compute device, plus its `Shape` and `Storage`.

mod core;
mod id;
mod shape;
mod storage;

pub use core::Tensor;
pub use id::TensorId;
pub use shape::Shape;
pub use storage::Storage;
