//! Gather kernels along a single axis (at / at_grad)

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::AtDims;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Wrap negative indices into range: `idx < 0 => idx + dim`.
///
/// Indices are stored with the data's element type and are rewritten in
/// place. Non-negative values are left alone, which makes the rewrite
/// idempotent.
#[inline]
pub fn canonical_axis_kernel<T: Element>(dim: usize, indices: &mut [T]) {
    let zero = T::zero();
    let dim = dim as f64;
    for idx in indices.iter_mut() {
        if *idx < zero {
            *idx = T::from_f64(idx.to_f64() + dim);
        }
    }
}

/// Convert stored index values to slice positions, rejecting non-integral
/// values and anything outside `[0, size)`.
fn resolve_positions<T: Element>(indices: &[T], size: usize) -> Result<Vec<usize>> {
    indices
        .iter()
        .map(|&value| {
            let value = value.to_f64();
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(Error::InvalidIndex { value });
            }
            let index = value as i64;
            if index < 0 || index as usize >= size {
                Err(Error::IndexOutOfBounds { index, size })
            } else {
                Ok(index as usize)
            }
        })
        .collect()
}

#[inline]
fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::shape_mismatch(&[expected], &[got]));
    }
    Ok(())
}

/// Gather slices along an axis.
///
/// For every outer block `o` and selected slice `j`:
/// `y[o, j, ..] = x[o, indices[j], ..]`
///
/// # Arguments
/// * `dims` - Flattened `[outer, slice, inner]` geometry
/// * `indices` - Canonical index list, `dims.y_slice_dim` entries
/// * `x` - Source data, `dims.x_count()` elements
/// * `y` - Output, `dims.y_count()` elements
/// * `parallel` - Split outer blocks across the rayon pool
pub fn at_kernel<T: Element>(
    dims: AtDims,
    indices: &[T],
    x: &[T],
    y: &mut [T],
    parallel: bool,
) -> Result<()> {
    check_len(dims.y_slice_dim, indices.len())?;
    check_len(dims.x_count(), x.len())?;
    check_len(dims.y_count(), y.len())?;
    let positions = resolve_positions(indices, dims.x_slice_dim)?;
    if y.is_empty() {
        return Ok(());
    }

    let inner = dims.inner_dim;
    let x_block = dims.x_slice_dim * inner;
    let y_block = dims.y_slice_dim * inner;

    let gather = |(outer, y_out): (usize, &mut [T])| {
        let x_in = &x[outer * x_block..(outer + 1) * x_block];
        for (j, &pos) in positions.iter().enumerate() {
            y_out[j * inner..(j + 1) * inner]
                .copy_from_slice(&x_in[pos * inner..(pos + 1) * inner]);
        }
    };

    #[cfg(feature = "rayon")]
    if parallel {
        y.par_chunks_mut(y_block).enumerate().for_each(gather);
        return Ok(());
    }

    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    y.chunks_mut(y_block).enumerate().for_each(gather);
    Ok(())
}

/// Scatter-add gradient slices back along an axis.
///
/// For every outer block `o` and selected slice `j`:
/// `dx[o, indices[j], ..] += dy[o, j, ..]`
///
/// Repeated indices accumulate. Each outer block of `dx` is written by a
/// single task, so the parallel path needs no atomics.
pub fn at_grad_kernel<T: Element>(
    dims: AtDims,
    indices: &[T],
    dy: &[T],
    dx: &mut [T],
    parallel: bool,
) -> Result<()> {
    check_len(dims.y_slice_dim, indices.len())?;
    check_len(dims.y_count(), dy.len())?;
    check_len(dims.x_count(), dx.len())?;
    let positions = resolve_positions(indices, dims.x_slice_dim)?;
    if dx.is_empty() || dy.is_empty() {
        return Ok(());
    }

    let inner = dims.inner_dim;
    let x_block = dims.x_slice_dim * inner;
    let y_block = dims.y_slice_dim * inner;

    let scatter = |(outer, dx_out): (usize, &mut [T])| {
        let dy_in = &dy[outer * y_block..(outer + 1) * y_block];
        for (j, &pos) in positions.iter().enumerate() {
            let src = &dy_in[j * inner..(j + 1) * inner];
            for (d, &s) in dx_out[pos * inner..(pos + 1) * inner].iter_mut().zip(src) {
                *d += s;
            }
        }
    };

    #[cfg(feature = "rayon")]
    if parallel {
        dx.par_chunks_mut(x_block).enumerate().for_each(scatter);
        return Ok(());
    }

    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    dx.chunks_mut(x_block).enumerate().for_each(scatter);
    Ok(())
}
