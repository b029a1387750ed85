//! Error types for opgraph

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using opgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running operators
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index (after canonicalization)
        index: i64,
        /// Size of the dimension
        size: usize,
    },

    /// Index value that does not name a whole position (NaN, infinite or fractional)
    #[error("Index value {value} is not an integral position")]
    InvalidIndex {
        /// The stored index value
        value: f64,
    },

    /// Index list handed to a gather is empty
    #[error("Operator '{op}' requires a non-empty index list")]
    EmptyIndices {
        /// The operation name
        op: &'static str,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Named tensor is not present in the workspace
    #[error("Tensor '{name}' does not exist in the workspace")]
    TensorNotFound {
        /// Tensor name
        name: String,
    },

    /// No constructor deployed for this op type on the current runtime
    #[error("Operator '{op_type}' is not registered for runtime '{runtime}'")]
    OperatorNotRegistered {
        /// Operator type name
        op_type: String,
        /// Runtime name
        runtime: &'static str,
    },

    /// Def does not satisfy the declared operator schema
    #[error("Operator '{op_type}' expects {expected} {kind}, got {got}")]
    ArityMismatch {
        /// Operator type name
        op_type: String,
        /// "inputs" or "outputs"
        kind: &'static str,
        /// Declared arity
        expected: usize,
        /// Arity found on the def
        got: usize,
    },

    /// No gradient maker registered for this op type
    #[error("No gradient registered for operator '{op_type}'")]
    NoGradient {
        /// Operator type name
        op_type: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create a missing tensor error
    pub fn tensor_not_found(name: impl Into<String>) -> Self {
        Self::TensorNotFound { name: name.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg: arg.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a violated operator precondition.
    ///
    /// Fatal errors are graph-construction bugs (empty index lists, dtypes
    /// with no kernel, bad axes). The executor logs and propagates them but
    /// never retries or recovers; callers are expected to abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyIndices { .. }
                | Self::UnsupportedDType { .. }
                | Self::InvalidDimension { .. }
                | Self::IndexOutOfBounds { .. }
                | Self::InvalidIndex { .. }
                | Self::DTypeMismatch { .. }
                | Self::ArityMismatch { .. }
        )
    }
}
