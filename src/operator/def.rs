//! Operator definitions and their arguments

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A single operator argument value
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Integer scalar (also used for booleans stored as 0/1)
    Int(i64),
    /// Boolean flag
    Bool(bool),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Declarative description of one operator node in a graph
///
/// Inputs and outputs refer to tensors in a workspace by name.
///
/// # Example
///
/// ```ignore
/// let def = OperatorDef::new("At")
///     .with_name("gather0")
///     .input("x")
///     .input("indices")
///     .output("y")
///     .arg("axis", 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperatorDef {
    /// Operator type name used for registry lookups (e.g. "At")
    pub op_type: String,
    /// Instance name, used in logs
    pub name: String,
    /// Input tensor names
    pub inputs: Vec<String>,
    /// Output tensor names
    pub outputs: Vec<String>,
    /// Named arguments
    pub args: BTreeMap<String, ArgValue>,
}

impl OperatorDef {
    /// Create an empty def of the given type
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            ..Default::default()
        }
    }

    /// Set the instance name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append an input tensor name
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    /// Append an output tensor name
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    /// Set an argument
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Integer argument, or `default` when absent
    pub fn arg_i64(&self, key: &str, default: i64) -> Result<i64> {
        match self.args.get(key) {
            None => Ok(default),
            Some(ArgValue::Int(v)) => Ok(*v),
            Some(other) => Err(self.wrong_kind(key, "int", other)),
        }
    }

    /// Boolean argument, or `default` when absent
    ///
    /// Integers are accepted as 0/1 flags.
    pub fn arg_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.arg_opt_bool(key)?.unwrap_or(default))
    }

    /// Boolean argument if present
    pub fn arg_opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.args.get(key) {
            None => Ok(None),
            Some(ArgValue::Bool(v)) => Ok(Some(*v)),
            Some(ArgValue::Int(v)) => Ok(Some(*v != 0)),
            Some(other) => Err(self.wrong_kind(key, "bool", other)),
        }
    }

    fn wrong_kind(&self, key: &str, expected: &str, got: &ArgValue) -> Error {
        Error::invalid_argument(
            key,
            format!(
                "operator '{}' expects {} but got {}",
                self.op_type,
                expected,
                got.kind()
            ),
        )
    }
}
