//! Gradient registration and backward-def execution tests

use crate::common::{create_cpu_workspace, feed_f32};
use opgraph::error::Error;
use opgraph::gradient::{GradientMaker, GradientNames, backward_defs, gradient_defs, single_def};
use opgraph::operator::OperatorDef;
use opgraph::registry;

#[test]
fn test_at_gradient_def_wiring() {
    let def = OperatorDef::new("At")
        .with_name("embed")
        .input("table")
        .input("ids")
        .output("rows")
        .arg("axis", 0);

    let defs = gradient_defs(&def).unwrap();

    assert_eq!(defs.len(), 1);
    let grad = &defs[0];
    assert_eq!(grad.op_type, "AtGradient");
    assert_eq!(grad.name, "embed_grad");
    assert_eq!(grad.inputs, ["table", "ids", "rows_grad"]);
    assert_eq!(grad.outputs, ["table_grad"]);
    assert_eq!(grad.arg_i64("axis", -1).unwrap(), 0);
}

#[test]
fn test_backward_defs_run_through_chain() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    feed_f32(&mut ws, "cols", &[2.0, 0.0], &[2]);
    feed_f32(&mut ws, "rows", &[1.0], &[1]);

    let forward = [
        OperatorDef::new("At")
            .input("x")
            .input("cols")
            .output("y")
            .arg("axis", 1),
        OperatorDef::new("At")
            .input("y")
            .input("rows")
            .output("z")
            .arg("axis", 0),
    ];
    ws.run_operators(&forward).unwrap();
    assert_eq!(ws.fetch_tensor("z").unwrap().to_vec::<f32>(), [6.0, 4.0]);

    let backward = backward_defs(&forward).unwrap();
    assert_eq!(backward[0].outputs, ["y_grad"]);
    assert_eq!(backward[1].outputs, ["x_grad"]);

    feed_f32(&mut ws, "z_grad", &[1.0, 1.0], &[1, 2]);
    ws.run_operators(&backward).unwrap();

    let dx = ws.fetch_tensor("x_grad").unwrap();
    assert_eq!(dx.shape(), &[2, 3]);
    assert_eq!(dx.to_vec::<f32>(), [0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_backward_defs_reject_malformed_forward_def() {
    let def = OperatorDef::new("At").input("x").output("y");
    let err = backward_defs(&[def]).unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_no_gradient_registered() {
    let def = OperatorDef::new("AtGradient").input("a").output("b");
    assert!(matches!(
        backward_defs(&[def]),
        Err(Error::NoGradient { .. })
    ));
}

struct PassThrough;

impl GradientMaker for PassThrough {
    fn make_defs(&self, def: &OperatorDef) -> Vec<OperatorDef> {
        let n = GradientNames::new(def);
        vec![single_def(def, "Copy", vec![n.go(0)], vec![n.gi(0)])]
    }
}

#[test]
fn test_register_custom_gradient() {
    registry::register_gradient("TestPassThrough", PassThrough);
    let def = OperatorDef::new("TestPassThrough").input("a").output("b");

    let defs = gradient_defs(&def).unwrap();

    assert_eq!(defs[0].op_type, "Copy");
    assert_eq!(defs[0].name, "");
    assert_eq!(defs[0].inputs, ["b_grad"]);
    assert_eq!(defs[0].outputs, ["a_grad"]);
}
