//! Memory operation kernels

use crate::dtype::Element;

/// Fill buffer with a constant value
#[inline]
pub fn set_kernel<T: Element>(value: T, out: &mut [T]) {
    out.fill(value);
}
