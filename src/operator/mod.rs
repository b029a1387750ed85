//! Operator execution contract
//!
//! An operator is built from an [`OperatorDef`] and run against a
//! [`Workspace`]. Running is split into three hooks:
//!
//! ```text
//! share_before_run   swap outputs for pooled scratch buffers (optional)
//! run_on_device      shape inference, dtype dispatch, kernel launch
//! clear_after_run    hand consumed inputs back to the buffer pool (optional)
//! ```
//!
//! Per-call state (slice dims, output shapes) is recomputed by every
//! `run_on_device`; only the configuration read from the def persists.

mod def;
mod schema;

pub use def::{ArgValue, OperatorDef};
pub use schema::OpSchema;

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::workspace::Workspace;

/// A runnable operator instance bound to runtime `R`
pub trait Operator<R: Runtime> {
    /// Shared operator state (def and tensor names)
    fn base(&self) -> &OperatorBase;

    /// Compute outputs from inputs on the workspace's device
    fn run_on_device(&mut self, ws: &mut Workspace<R>) -> Result<()>;

    /// Hook invoked before `run_on_device`
    fn share_before_run(&mut self, _ws: &mut Workspace<R>) -> Result<()> {
        Ok(())
    }

    /// Hook invoked after a successful `run_on_device`
    fn clear_after_run(&mut self, _ws: &mut Workspace<R>) -> Result<()> {
        Ok(())
    }

    /// Run all three hooks in order
    fn run(&mut self, ws: &mut Workspace<R>) -> Result<()> {
        self.share_before_run(ws)?;
        self.run_on_device(ws)?;
        self.clear_after_run(ws)
    }
}

/// State common to every operator: its def and tensor name lookups
#[derive(Clone, Debug)]
pub struct OperatorBase {
    def: OperatorDef,
}

impl OperatorBase {
    /// Wrap a def
    pub fn new(def: &OperatorDef) -> Self {
        Self { def: def.clone() }
    }

    /// The def this operator was built from
    #[inline]
    pub fn def(&self) -> &OperatorDef {
        &self.def
    }

    /// Operator type name
    #[inline]
    pub fn op_type(&self) -> &str {
        &self.def.op_type
    }

    /// Name of input `i`; negative values count from the end (`-1` is last)
    pub fn input_name(&self, i: isize) -> Result<&str> {
        lookup(&self.def.inputs, i, "input")
    }

    /// Name of output `i`; negative values count from the end
    pub fn output_name(&self, i: isize) -> Result<&str> {
        lookup(&self.def.outputs, i, "output")
    }
}

fn lookup<'a>(names: &'a [String], i: isize, kind: &'static str) -> Result<&'a str> {
    let len = names.len() as isize;
    let idx = if i < 0 { i + len } else { i };
    if !(0..len).contains(&idx) {
        return Err(Error::invalid_argument(
            kind,
            format!("index {i} out of range for {len} {kind}s"),
        ));
    }
    Ok(names[idx as usize].as_str())
}
