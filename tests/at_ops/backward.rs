//! Gradient (scatter-add) tests

use crate::common::{at_def, at_grad_def, create_cpu_workspace, create_cpu_workspace_with, feed_f32};
use opgraph::dtype::DType;
use opgraph::error::Error;
use opgraph::runtime::cpu::CpuRuntime;
use opgraph::tensor::Tensor;
use opgraph::workspace::{Workspace, WorkspaceConfig};

fn feed_forward_inputs(ws: &mut Workspace<CpuRuntime>) {
    feed_f32(ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    feed_f32(ws, "indices", &[2.0, 0.0], &[2]);
}

// ============================================================================
// Overwrite mode
// ============================================================================

#[test]
fn test_at_gradient_end_to_end() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    ws.run_operator(&at_def(1)).unwrap();
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);

    ws.run_operator(&at_grad_def(1)).unwrap();

    let dx = ws.fetch_tensor("x_grad").unwrap();
    assert_eq!(dx.shape(), &[2, 3]);
    assert_eq!(dx.to_vec::<f32>(), [1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_at_gradient_duplicates_accumulate() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[0.0; 6], &[3, 2]);
    feed_f32(&mut ws, "indices", &[1.0, 1.0, 0.0], &[3]);
    feed_f32(&mut ws, "y_grad", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);

    ws.run_operator(&at_grad_def(0)).unwrap();

    assert_eq!(
        ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>(),
        [5.0, 6.0, 4.0, 6.0, 0.0, 0.0]
    );
}

#[test]
fn test_at_gradient_overwrite_is_idempotent() {
    let (mut ws, _device) = create_cpu_workspace_with(WorkspaceConfig::default().with_share_grads(false));
    feed_forward_inputs(&mut ws);
    feed_f32(&mut ws, "y_grad", &[1.0, 2.0, 3.0, 4.0], &[2, 2]);

    ws.run_operator(&at_grad_def(1)).unwrap();
    let first = ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>();
    ws.run_operator(&at_grad_def(1)).unwrap();
    let second = ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>();

    assert_eq!(first, [2.0, 0.0, 1.0, 4.0, 0.0, 3.0]);
    assert_eq!(first, second);
}

#[test]
fn test_at_gradient_overwrite_clears_stale_output() {
    let (mut ws, device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    ws.feed_tensor("x_grad", Tensor::full(&[2, 3], 9.0f32, &device));
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);

    ws.run_operator(&at_grad_def(1)).unwrap();

    assert_eq!(
        ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>(),
        [1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
    );
}

// ============================================================================
// Accumulate mode
// ============================================================================

#[test]
fn test_at_gradient_accumulate_sums_runs() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    let def = at_grad_def(1).arg("acc_grad", true);

    feed_f32(&mut ws, "x_grad", &[0.0; 6], &[2, 3]);
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);
    ws.run_operator(&def).unwrap();
    // y_grad was handed to the buffer pool; feed the second contribution
    feed_f32(&mut ws, "y_grad", &[2.0; 4], &[2, 2]);
    ws.run_operator(&def).unwrap();

    assert_eq!(
        ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>(),
        [3.0, 0.0, 3.0, 3.0, 0.0, 3.0]
    );
}

#[test]
fn test_at_gradient_accumulate_keeps_existing_output() {
    let (mut ws, device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    // a pooled buffer must not replace the accumulator
    ws.release_buffer(Tensor::zeros(&[2, 3], DType::F32, &device));
    ws.feed_tensor("x_grad", Tensor::full(&[2, 3], 10.0f32, &device));
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);

    ws.run_operator(&at_grad_def(1).arg("acc_grad", true)).unwrap();

    assert_eq!(
        ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>(),
        [11.0, 10.0, 11.0, 11.0, 10.0, 11.0]
    );
}

// ============================================================================
// Buffer sharing
// ============================================================================

#[test]
fn test_at_gradient_releases_output_grad() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);
    let dy_id = ws.fetch_tensor("y_grad").unwrap().id();

    ws.run_operator(&at_grad_def(1)).unwrap();

    assert!(!ws.has_tensor("y_grad"));
    assert_eq!(ws.num_buffers(), 1);

    // the next gradient op writes into the released tensor
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);
    ws.run_operator(&at_grad_def(1)).unwrap();
    let dx = ws.fetch_tensor("x_grad").unwrap();
    assert_eq!(dx.id(), dy_id);
    assert_eq!(dx.to_vec::<f32>(), [1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_at_gradient_share_disabled_per_op() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_forward_inputs(&mut ws);
    feed_f32(&mut ws, "y_grad", &[1.0; 4], &[2, 2]);

    ws.run_operator(&at_grad_def(1).arg("share_grads", false)).unwrap();

    assert!(ws.has_tensor("y_grad"));
    assert_eq!(ws.num_buffers(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_at_gradient_unsupported_dtype_is_fatal() {
    let (mut ws, device) = create_cpu_workspace();
    ws.feed_tensor("x", Tensor::zeros(&[3], DType::I32, &device));
    feed_f32(&mut ws, "indices", &[0.0], &[1]);
    feed_f32(&mut ws, "y_grad", &[1.0], &[1]);

    let err = ws.run_operator(&at_grad_def(0)).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedDType {
            dtype: DType::I32,
            op: "AtGradient"
        }
    ));
    assert!(err.is_fatal());
    // a failed run does not consume the output gradient
    assert!(ws.has_tensor("y_grad"));
}

#[test]
fn test_at_gradient_reads_indices_as_stored() {
    // without a forward run the negative index is never wrapped
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[0.0; 3], &[3]);
    feed_f32(&mut ws, "indices", &[-1.0], &[1]);
    feed_f32(&mut ws, "y_grad", &[1.0], &[1]);

    let err = ws.run_operator(&at_grad_def(0)).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { index: -1, size: 3 }));
    assert!(err.is_fatal());
    assert_eq!(ws.fetch_tensor("indices").unwrap().to_vec::<f32>(), [-1.0]);

    // after the forward op has canonicalized them the same indices work
    ws.run_operator(&at_def(0)).unwrap();
    ws.run_operator(&at_grad_def(0)).unwrap();
    assert_eq!(
        ws.fetch_tensor("x_grad").unwrap().to_vec::<f32>(),
        [0.0, 0.0, 1.0]
    );
}

#[test]
fn test_at_gradient_arity_checked() {
    let (mut ws, _device) = create_cpu_workspace();
    let def = at_grad_def(0).input("extra");
    let err = ws.run_operator(&def).unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { .. }));
}
