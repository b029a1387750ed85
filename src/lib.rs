//! # opgraph
//!
//! **Graph operators over named tensors, with a pluggable device runtime.**
//!
//! opgraph executes operator definitions against a [`Workspace`] that owns
//! every tensor by name. Operators are generic over a [`Runtime`] and reach
//! the device only through typed kernel traits, so adding a backend means
//! implementing those traits for its context.
//!
//! ## Operators
//!
//! - `At`: gather slices of a tensor along one axis by an index list
//! - `AtGradient`: scatter-add the output gradient back into the source shape
//!
//! Every forward operator with a registered [`GradientMaker`] can be turned
//! into its backward defs with [`backward_defs`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opgraph::prelude::*;
//!
//! let device = CpuDevice::new();
//! let mut ws = Workspace::<CpuRuntime>::new(&device);
//! ws.feed_tensor("x", Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], &device));
//! ws.feed_tensor("i", Tensor::from_slice(&[2.0f32, 0.0], &[2], &device));
//!
//! let at = OperatorDef::new("At").input("x").input("i").output("y").arg("axis", 1);
//! ws.run_operator(&at)?;
//! assert_eq!(ws.fetch_tensor("y")?.to_vec::<f32>(), vec![3.0, 1.0, 6.0, 4.0]);
//!
//! ws.feed_tensor("y_grad", Tensor::full(&[2, 2], 1.0f32, &device));
//! ws.run_operators(&backward_defs(&[at])?)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `rayon` (default): Multi-threaded CPU kernels
//!
//! [`Workspace`]: workspace::Workspace
//! [`Runtime`]: runtime::Runtime
//! [`GradientMaker`]: gradient::GradientMaker
//! [`backward_defs`]: gradient::backward_defs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod gradient;
pub mod operator;
pub mod ops;
pub mod registry;
pub mod runtime;
pub mod tensor;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::gradient::{GradientMaker, backward_defs};
    pub use crate::operator::{Operator, OperatorDef};
    pub use crate::runtime::{Device, DeviceContext, Runtime};
    pub use crate::tensor::{Shape, Tensor};
    pub use crate::workspace::{Workspace, WorkspaceConfig};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuContext, CpuDevice, CpuRuntime};
}
