//! Operator, schema, and gradient registration
//!
//! Three tables tie an op type name to its behaviour:
//!
//! | Table | Scope | Contents |
//! |-------|-------|----------|
//! | [`OperatorRegistry<R>`] | per runtime, owned by a workspace | constructors |
//! | schema table | process-wide | [`OpSchema`] arity |
//! | gradient table | process-wide | [`GradientMaker`] |
//!
//! Constructors are per runtime because an operator is only deployable where
//! the device context implements its kernels. Schemas and gradient makers do
//! not depend on the device, so they live in global tables seeded with the
//! builtin operators on first access.

use crate::error::{Error, Result};
use crate::gradient::GradientMaker;
use crate::operator::{OpSchema, Operator, OperatorDef};
use crate::ops::at::{AtGradientOp, AtOp, GetAtGradient};
use crate::runtime::{AtKernel, Runtime};
use crate::workspace::Workspace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Constructor for an operator on runtime `R`
pub type OperatorCreator<R> = fn(&OperatorDef, &Workspace<R>) -> Result<Box<dyn Operator<R>>>;

/// Op-type name to constructor table for one runtime
pub struct OperatorRegistry<R: Runtime> {
    creators: HashMap<String, OperatorCreator<R>>,
}

impl<R: Runtime> OperatorRegistry<R> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            creators: HashMap::new(),
        }
    }

    /// Deploy a constructor under `op_type`, replacing any previous one
    pub fn register(&mut self, op_type: impl Into<String>, creator: OperatorCreator<R>) {
        self.creators.insert(op_type.into(), creator);
    }

    /// Whether `op_type` is deployed
    pub fn contains(&self, op_type: &str) -> bool {
        self.creators.contains_key(op_type)
    }

    /// Build the operator described by `def`
    pub fn create(&self, def: &OperatorDef, ws: &Workspace<R>) -> Result<Box<dyn Operator<R>>> {
        let creator = self
            .creators
            .get(&def.op_type)
            .ok_or_else(|| Error::OperatorNotRegistered {
                op_type: def.op_type.clone(),
                runtime: R::name(),
            })?;
        creator(def, ws)
    }
}

impl<R: Runtime> OperatorRegistry<R>
where
    R::Context: AtKernel<f32>,
{
    /// Registry with every builtin operator deployed
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("At", create_at::<R>);
        registry.register("AtGradient", create_at_gradient::<R>);
        registry
    }
}

impl<R: Runtime> Default for OperatorRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn create_at<R: Runtime>(def: &OperatorDef, ws: &Workspace<R>) -> Result<Box<dyn Operator<R>>>
where
    R::Context: AtKernel<f32>,
{
    let op: Box<dyn Operator<R>> = Box::new(AtOp::<R>::new(def, ws)?);
    Ok(op)
}

fn create_at_gradient<R: Runtime>(
    def: &OperatorDef,
    ws: &Workspace<R>,
) -> Result<Box<dyn Operator<R>>>
where
    R::Context: AtKernel<f32>,
{
    let op: Box<dyn Operator<R>> = Box::new(AtGradientOp::<R>::new(def, ws)?);
    Ok(op)
}

// ============================================================================
// Global schema and gradient tables
// ============================================================================

static SCHEMAS: OnceLock<RwLock<HashMap<String, OpSchema>>> = OnceLock::new();
static GRADIENTS: OnceLock<RwLock<HashMap<String, Arc<dyn GradientMaker>>>> = OnceLock::new();

fn schemas() -> &'static RwLock<HashMap<String, OpSchema>> {
    SCHEMAS.get_or_init(|| {
        let mut table = HashMap::new();
        table.insert("At".to_string(), OpSchema::new(2, 1));
        table.insert("AtGradient".to_string(), OpSchema::new(3, 1));
        RwLock::new(table)
    })
}

fn gradients() -> &'static RwLock<HashMap<String, Arc<dyn GradientMaker>>> {
    GRADIENTS.get_or_init(|| {
        let mut table: HashMap<String, Arc<dyn GradientMaker>> = HashMap::new();
        table.insert("At".to_string(), Arc::new(GetAtGradient));
        RwLock::new(table)
    })
}

/// Declare the arity of `op_type`
pub fn register_schema(op_type: impl Into<String>, schema: OpSchema) {
    schemas().write().insert(op_type.into(), schema);
}

/// Declared arity of `op_type`, if any
pub fn schema(op_type: &str) -> Option<OpSchema> {
    schemas().read().get(op_type).copied()
}

/// Link a gradient maker to `op_type`
pub fn register_gradient(op_type: impl Into<String>, maker: impl GradientMaker + 'static) {
    gradients().write().insert(op_type.into(), Arc::new(maker));
}

/// Gradient maker registered for `op_type`, if any
pub fn gradient_maker(op_type: &str) -> Option<Arc<dyn GradientMaker>> {
    gradients().read().get(op_type).cloned()
}
