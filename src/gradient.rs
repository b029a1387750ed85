//! Gradient registration and backward-def generation
//!
//! A [`GradientMaker`] turns a forward [`OperatorDef`] into the defs that
//! compute its input gradients. Gradient tensors are named after the tensor
//! they differentiate: the gradient of `x` is `x_grad`.

use crate::error::{Error, Result};
use crate::operator::OperatorDef;
use crate::registry;

/// Suffix appended to a tensor name to name its gradient
pub const GRAD_SUFFIX: &str = "_grad";

/// Name of the gradient tensor for `name`
pub fn grad_name(name: &str) -> String {
    format!("{name}{GRAD_SUFFIX}")
}

/// Builds backward defs for one forward op type
pub trait GradientMaker: Send + Sync {
    /// Defs computing the input gradients of `def`
    fn make_defs(&self, def: &OperatorDef) -> Vec<OperatorDef>;
}

/// Tensor-name helpers for writing gradient makers
///
/// `i(k)` / `o(k)` are the forward def's input and output names;
/// `gi(k)` / `go(k)` are their gradient names.
#[derive(Copy, Clone, Debug)]
pub struct GradientNames<'a> {
    def: &'a OperatorDef,
}

impl<'a> GradientNames<'a> {
    /// Helpers over the forward def
    pub fn new(def: &'a OperatorDef) -> Self {
        Self { def }
    }

    /// Forward input `k`
    pub fn i(&self, k: usize) -> String {
        self.def.inputs[k].clone()
    }

    /// Forward output `k`
    pub fn o(&self, k: usize) -> String {
        self.def.outputs[k].clone()
    }

    /// Gradient of forward input `k`
    pub fn gi(&self, k: usize) -> String {
        grad_name(&self.def.inputs[k])
    }

    /// Gradient of forward output `k`
    pub fn go(&self, k: usize) -> String {
        grad_name(&self.def.outputs[k])
    }
}

/// One backward def of type `op_type` that inherits `def`'s arguments
pub fn single_def(
    def: &OperatorDef,
    op_type: impl Into<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
) -> OperatorDef {
    let op_type = op_type.into();
    let name = if def.name.is_empty() {
        String::new()
    } else {
        grad_name(&def.name)
    };
    OperatorDef {
        op_type,
        name,
        inputs,
        outputs,
        args: def.args.clone(),
    }
}

/// Backward defs for a single forward def
///
/// The def is checked against its schema first, so makers can index its
/// declared inputs and outputs directly.
pub fn gradient_defs(def: &OperatorDef) -> Result<Vec<OperatorDef>> {
    if let Some(schema) = registry::schema(&def.op_type) {
        schema.verify(def)?;
    }
    let maker = registry::gradient_maker(&def.op_type).ok_or_else(|| Error::NoGradient {
        op_type: def.op_type.clone(),
    })?;
    Ok(maker.make_defs(def))
}

/// Backward defs for a forward op list, in execution order
///
/// Forward ops are visited last to first so that every gradient is produced
/// before the op that consumes it.
pub fn backward_defs(forward: &[OperatorDef]) -> Result<Vec<OperatorDef>> {
    let mut defs = Vec::new();
    for def in forward.iter().rev() {
        defs.extend(gradient_defs(def)?);
    }
    Ok(defs)
}
