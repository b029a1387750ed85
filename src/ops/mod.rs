//! Builtin operators
//!
//! Each operator is generic over [`Runtime`](crate::runtime::Runtime) and
//! dispatches on the input dtype to a typed kernel trait implemented by the
//! runtime's device context.

pub mod at;

pub use at::{AtGradientOp, AtOp, GetAtGradient};
