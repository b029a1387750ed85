//! Operator schemas: declared input/output arity

use super::OperatorDef;
use crate::error::{Error, Result};

/// Declared arity of an operator type
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpSchema {
    /// Required number of inputs
    pub num_inputs: usize,
    /// Required number of outputs
    pub num_outputs: usize,
}

impl OpSchema {
    /// Create a schema with fixed arity
    pub const fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
        }
    }

    /// Check that `def` has the declared number of inputs and outputs
    pub fn verify(&self, def: &OperatorDef) -> Result<()> {
        if def.inputs.len() != self.num_inputs {
            return Err(Error::ArityMismatch {
                op_type: def.op_type.clone(),
                kind: "inputs",
                expected: self.num_inputs,
                got: def.inputs.len(),
            });
        }
        if def.outputs.len() != self.num_outputs {
            return Err(Error::ArityMismatch {
                op_type: def.op_type.clone(),
                kind: "outputs",
                expected: self.num_outputs,
                got: def.outputs.len(),
            });
        }
        Ok(())
    }
}
