//! Gather along an axis by index list (`At`) and its gradient (`AtGradient`)
//!
//! ```text
//! At:          y[o, j, i]          = x[o, indices[j], i]
//! AtGradient:  dx[o, indices[j], i] += dy[o, j, i]
//! ```
//!
//! Indices are stored with the data's element type. The forward op
//! canonicalizes them in place (`idx < 0 => idx + dim`), so the index tensor
//! left in the workspace is the canonical one and the gradient op reads it as
//! is.

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::gradient::{GradientMaker, GradientNames, single_def};
use crate::operator::{Operator, OperatorBase, OperatorDef};
use crate::runtime::{AtDims, AtKernel, Runtime};
use crate::tensor::{Shape, Tensor};
use crate::workspace::Workspace;
use log::debug;
use std::marker::PhantomData;

/// Resolve the `axis` argument against `x`
fn resolve_axis<R: Runtime>(axis: isize, x: &Tensor<R>) -> Result<usize> {
    x.dims()
        .canonical_axis(axis)
        .ok_or(Error::InvalidDimension {
            dim: axis,
            ndim: x.ndim(),
        })
}

/// Slice geometry of `x` around `axis`, with `y_slice_dim` set from `indices`
fn slice_dims<R: Runtime>(x: &Tensor<R>, axis: usize, indices: &Tensor<R>) -> AtDims {
    AtDims {
        outer_dim: x.count_range(0, axis),
        inner_dim: x.count_from(axis + 1),
        x_slice_dim: x.dim(axis),
        y_slice_dim: indices.count(),
    }
}

// ============================================================================
// At
// ============================================================================

/// Forward gather: inputs `(x, indices)`, output `y`
///
/// Arguments: `axis` (int, default 0, negative counts from the end).
pub struct AtOp<R: Runtime> {
    base: OperatorBase,
    axis: isize,
    dims: AtDims,
    output_dims: Shape,
    _runtime: PhantomData<R>,
}

impl<R: Runtime> AtOp<R>
where
    R::Context: AtKernel<f32>,
{
    /// Build from a def
    pub fn new(def: &OperatorDef, _ws: &Workspace<R>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(def),
            axis: def.arg_i64("axis", 0)? as isize,
            dims: AtDims::default(),
            output_dims: Shape::new(),
            _runtime: PhantomData,
        })
    }

    /// Geometry computed by the last run
    pub fn dims(&self) -> AtDims {
        self.dims
    }

    /// Output shape computed by the last run
    pub fn output_dims(&self) -> &Shape {
        &self.output_dims
    }

    fn forward(
        &mut self,
        ctx: &R::Context,
        x: &Tensor<R>,
        indices: &mut Tensor<R>,
        y: &mut Tensor<R>,
    ) -> Result<()> {
        let axis = resolve_axis(self.axis, x)?;
        self.dims = slice_dims(x, axis, indices);
        self.output_dims = x.dims();
        self.output_dims[axis] = self.dims.y_slice_dim;
        if self.dims.y_slice_dim == 0 {
            return Err(Error::EmptyIndices { op: "At" });
        }
        y.reshape(&self.output_dims);
        debug!(
            "At '{}': axis={} {:?} -> {:?}",
            self.base.def().name,
            axis,
            self.dims,
            self.output_dims
        );

        match x.dtype() {
            DType::F32 => self.run_with_type::<f32>(ctx, x, indices, y),
            other => Err(Error::unsupported_dtype(other, "At")),
        }
    }

    fn run_with_type<T: Element>(
        &self,
        ctx: &R::Context,
        x: &Tensor<R>,
        indices: &mut Tensor<R>,
        y: &mut Tensor<R>,
    ) -> Result<()>
    where
        R::Context: AtKernel<T>,
    {
        if !indices.is_type::<T>() {
            return Err(Error::DTypeMismatch {
                lhs: indices.dtype(),
                rhs: T::DTYPE,
            });
        }
        let x_data = x.data::<T>()?;
        let idx = indices.mutable_data::<T>();
        ctx.canonical_axis(self.dims.x_slice_dim, idx);
        ctx.at(self.dims, idx, x_data, y.mutable_data::<T>())
    }
}

impl<R: Runtime> Operator<R> for AtOp<R>
where
    R::Context: AtKernel<f32>,
{
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn run_on_device(&mut self, ws: &mut Workspace<R>) -> Result<()> {
        let x_name = self.base.input_name(0)?.to_string();
        let idx_name = self.base.input_name(1)?.to_string();
        let y_name = self.base.output_name(0)?.to_string();

        let mut indices = ws.take_tensor(&idx_name)?;
        let mut y = ws.take_or_create(&y_name);
        let result = ws
            .fetch_tensor(&x_name)
            .and_then(|x| self.forward(ws.context(), x, &mut indices, &mut y));
        ws.feed_tensor(idx_name, indices);
        ws.feed_tensor(y_name, y);
        result
    }
}

// ============================================================================
// AtGradient
// ============================================================================

/// Backward of `At`: inputs `(x, indices, dy)`, output `dx`
///
/// `x` is read for its shape only. Arguments:
/// - `axis` (int, default 0)
/// - `acc_grad` (bool, default false): add into `dx` instead of overwriting
/// - `share_grads` (bool, default from the workspace config): borrow a pooled
///   buffer for `dx` and release `dy` to the pool afterwards
pub struct AtGradientOp<R: Runtime> {
    base: OperatorBase,
    axis: isize,
    acc_grad: bool,
    share_grads: bool,
    dims: AtDims,
    _runtime: PhantomData<R>,
}

impl<R: Runtime> AtGradientOp<R>
where
    R::Context: AtKernel<f32>,
{
    /// Build from a def
    pub fn new(def: &OperatorDef, ws: &Workspace<R>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(def),
            axis: def.arg_i64("axis", 0)? as isize,
            acc_grad: def.arg_bool("acc_grad", false)?,
            share_grads: def.arg_bool("share_grads", ws.config().share_grads)?,
            dims: AtDims::default(),
            _runtime: PhantomData,
        })
    }

    /// Geometry computed by the last run
    pub fn dims(&self) -> AtDims {
        self.dims
    }

    /// Whether gradients are accumulated into the existing `dx`
    pub fn acc_grad(&self) -> bool {
        self.acc_grad
    }

    fn backward(
        &mut self,
        ctx: &R::Context,
        x: &Tensor<R>,
        indices: &Tensor<R>,
        dy: &Tensor<R>,
        dx: &mut Tensor<R>,
    ) -> Result<()> {
        let axis = resolve_axis(self.axis, x)?;
        self.dims = slice_dims(x, axis, indices);
        dx.reshape_like(x);
        debug!(
            "AtGradient '{}': axis={} acc_grad={} {:?}",
            self.base.def().name,
            axis,
            self.acc_grad,
            self.dims
        );

        match x.dtype() {
            DType::F32 => self.run_with_type::<f32>(ctx, indices, dy, dx),
            other => Err(Error::unsupported_dtype(other, "AtGradient")),
        }
    }

    fn run_with_type<T: Element>(
        &self,
        ctx: &R::Context,
        indices: &Tensor<R>,
        dy: &Tensor<R>,
        dx: &mut Tensor<R>,
    ) -> Result<()>
    where
        R::Context: AtKernel<T>,
    {
        let idx = indices.data::<T>()?;
        let dy_data = dy.data::<T>()?;
        let dx_data = dx.mutable_data::<T>();
        if !self.acc_grad {
            ctx.set(T::zero(), dx_data);
        }
        ctx.at_grad(self.dims, idx, dy_data, dx_data)
    }
}

impl<R: Runtime> Operator<R> for AtGradientOp<R>
where
    R::Context: AtKernel<f32>,
{
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn run_on_device(&mut self, ws: &mut Workspace<R>) -> Result<()> {
        let x_name = self.base.input_name(0)?.to_string();
        let idx_name = self.base.input_name(1)?.to_string();
        let dy_name = self.base.input_name(-1)?.to_string();
        let dx_name = self.base.output_name(0)?.to_string();

        let mut dx = ws.take_or_create(&dx_name);
        let result = fetch3(ws, &x_name, &idx_name, &dy_name)
            .and_then(|(x, indices, dy)| self.backward(ws.context(), x, indices, dy, &mut dx));
        ws.feed_tensor(dx_name, dx);
        result
    }

    /// Swap `dx` for a pooled scratch tensor when one is free.
    ///
    /// Skipped under `acc_grad`, which needs the existing `dx` contents.
    fn share_before_run(&mut self, ws: &mut Workspace<R>) -> Result<()> {
        if !self.share_grads || self.acc_grad {
            return Ok(());
        }
        if let Some(buffer) = ws.get_buffer() {
            let dx_name = self.base.output_name(0)?;
            debug!("AtGradient: '{}' reuses pooled {}", dx_name, buffer.id());
            ws.feed_tensor(dx_name, buffer);
        }
        Ok(())
    }

    /// Hand `dy` to the buffer pool; this op does not own it past the run.
    fn clear_after_run(&mut self, ws: &mut Workspace<R>) -> Result<()> {
        if !self.share_grads {
            return Ok(());
        }
        let dy_name = self.base.input_name(-1)?;
        if let Some(dy) = ws.remove_tensor(dy_name) {
            ws.release_buffer(dy);
        }
        Ok(())
    }
}

fn fetch3<'a, R: Runtime>(
    ws: &'a Workspace<R>,
    a: &str,
    b: &str,
    c: &str,
) -> Result<(&'a Tensor<R>, &'a Tensor<R>, &'a Tensor<R>)> {
    Ok((ws.fetch_tensor(a)?, ws.fetch_tensor(b)?, ws.fetch_tensor(c)?))
}

// ============================================================================
// Gradient registration
// ============================================================================

/// Wires `At` to `AtGradient`: `{x, indices, y_grad} -> {x_grad}`
#[derive(Copy, Clone, Debug, Default)]
pub struct GetAtGradient;

impl GradientMaker for GetAtGradient {
    fn make_defs(&self, def: &OperatorDef) -> Vec<OperatorDef> {
        let n = GradientNames::new(def);
        vec![single_def(
            def,
            format!("{}Gradient", def.op_type),
            vec![n.i(0), n.i(1), n.go(0)],
            vec![n.gi(0)],
        )]
    }
}
