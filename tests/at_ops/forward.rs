//! Forward gather tests

use crate::common::{assert_allclose_f32, at_def, create_cpu_workspace, create_cpu_workspace_with, feed_f32};
use opgraph::dtype::DType;
use opgraph::error::Error;
use opgraph::tensor::Tensor;
use opgraph::workspace::WorkspaceConfig;

// ============================================================================
// Gather correctness
// ============================================================================

#[test]
fn test_at_axis1_end_to_end() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    feed_f32(&mut ws, "indices", &[2.0, 0.0], &[2]);

    ws.run_operator(&at_def(1)).unwrap();

    let y = ws.fetch_tensor("y").unwrap();
    assert_eq!(y.shape(), &[2, 2]);
    assert_eq!(y.to_vec::<f32>(), [3.0, 1.0, 6.0, 4.0]);
}

#[test]
fn test_at_axis0_rows_with_duplicates() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
    feed_f32(&mut ws, "indices", &[2.0, 2.0, 0.0], &[3]);

    ws.run_operator(&at_def(0)).unwrap();

    let y = ws.fetch_tensor("y").unwrap();
    assert_eq!(y.shape(), &[3, 2]);
    assert_eq!(y.to_vec::<f32>(), [5.0, 6.0, 5.0, 6.0, 1.0, 2.0]);
}

#[test]
fn test_at_last_axis_of_3d() {
    let (mut ws, _device) = create_cpu_workspace();
    let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    feed_f32(&mut ws, "x", &data, &[2, 2, 3]);
    feed_f32(&mut ws, "indices", &[1.0], &[1]);

    ws.run_operator(&at_def(2)).unwrap();

    let y = ws.fetch_tensor("y").unwrap();
    assert_eq!(y.shape(), &[2, 2, 1]);
    assert_eq!(y.to_vec::<f32>(), [1.0, 4.0, 7.0, 10.0]);
}

#[test]
fn test_at_shape_law_flattens_indices() {
    let (mut ws, device) = create_cpu_workspace();
    ws.feed_tensor("x", Tensor::zeros(&[2, 3, 4], DType::F32, &device));
    feed_f32(&mut ws, "indices", &[0.0, 1.0, 2.0, 1.0], &[2, 2]);

    ws.run_operator(&at_def(1)).unwrap();

    assert_eq!(ws.fetch_tensor("y").unwrap().shape(), &[2, 4, 4]);
}

#[test]
fn test_at_reuses_output_tensor() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0], &[3]);
    feed_f32(&mut ws, "indices", &[0.0, 1.0], &[2]);
    ws.run_operator(&at_def(0)).unwrap();
    let id = ws.fetch_tensor("y").unwrap().id();

    feed_f32(&mut ws, "indices", &[2.0], &[1]);
    ws.run_operator(&at_def(0)).unwrap();

    let y = ws.fetch_tensor("y").unwrap();
    assert_eq!(y.id(), id);
    assert_eq!(y.to_vec::<f32>(), [3.0]);
}

#[test]
fn test_at_parallel_matches_serial() {
    let outer = 96;
    let data: Vec<f32> = (0..outer * 5 * 3).map(|v| (v as f32) * 0.5).collect();
    let indices = [4.0f32, -1.0, 0.0, 2.0, 2.0, -5.0];

    let mut results = Vec::new();
    for min_outer in [1, usize::MAX] {
        let (mut ws, _device) =
            create_cpu_workspace_with(WorkspaceConfig::default().with_parallel_min_outer(min_outer));
        feed_f32(&mut ws, "x", &data, &[outer, 5, 3]);
        feed_f32(&mut ws, "indices", &indices, &[indices.len()]);
        ws.run_operator(&at_def(1)).unwrap();
        results.push(ws.fetch_tensor("y").unwrap().to_vec::<f32>());
    }
    assert_allclose_f32(&results[0], &results[1], 0.0, 0.0, "parallel vs serial");
}

// ============================================================================
// Index canonicalization
// ============================================================================

#[test]
fn test_at_negative_indices_wrap() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    feed_f32(&mut ws, "indices", &[-1.0, -3.0], &[2]);

    ws.run_operator(&at_def(1)).unwrap();

    assert_eq!(
        ws.fetch_tensor("y").unwrap().to_vec::<f32>(),
        [3.0, 1.0, 6.0, 4.0]
    );
}

#[test]
fn test_at_canonicalizes_indices_in_place() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0], &[4]);
    feed_f32(&mut ws, "indices", &[-1.0, 1.0, -4.0], &[3]);

    ws.run_operator(&at_def(0)).unwrap();
    let canonical = [3.0, 1.0, 0.0];
    assert_eq!(ws.fetch_tensor("indices").unwrap().to_vec::<f32>(), canonical);

    // a second run sees canonical indices and changes nothing
    ws.run_operator(&at_def(0)).unwrap();
    assert_eq!(ws.fetch_tensor("indices").unwrap().to_vec::<f32>(), canonical);
    assert_eq!(ws.fetch_tensor("y").unwrap().to_vec::<f32>(), [4.0, 2.0, 1.0]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_at_empty_indices_is_fatal() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    feed_f32(&mut ws, "indices", &[], &[0]);

    let err = ws.run_operator(&at_def(1)).unwrap_err();
    assert!(matches!(err, Error::EmptyIndices { op: "At" }));
    assert!(err.is_fatal());
}

#[test]
fn test_at_unsupported_dtype_is_fatal() {
    let (mut ws, device) = create_cpu_workspace();
    ws.feed_tensor("x", Tensor::from_slice(&[1.0f64, 2.0], &[2], &device));
    ws.feed_tensor("indices", Tensor::from_slice(&[0.0f64], &[1], &device));

    let err = ws.run_operator(&at_def(0)).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedDType {
            dtype: DType::F64,
            op: "At"
        }
    ));
    assert!(err.is_fatal());
}

#[test]
fn test_at_index_out_of_range_is_fatal() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0], &[3]);
    feed_f32(&mut ws, "indices", &[0.0, 3.0], &[2]);

    let err = ws.run_operator(&at_def(0)).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { .. }));
    assert!(err.is_fatal());

    // below -dim stays out of range after wrapping
    feed_f32(&mut ws, "indices", &[-4.0], &[1]);
    let err = ws.run_operator(&at_def(0)).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { .. }));
}

#[test]
fn test_at_non_integral_index_is_fatal() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "x", &[1.0, 2.0, 3.0], &[3]);

    for bad in [f32::NAN, 2.7] {
        feed_f32(&mut ws, "indices", &[bad], &[1]);
        let err = ws.run_operator(&at_def(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex { .. }), "index {bad}");
        assert!(err.is_fatal());
    }
}

#[test]
fn test_at_missing_input_is_not_fatal() {
    let (mut ws, _device) = create_cpu_workspace();
    feed_f32(&mut ws, "indices", &[0.0], &[1]);

    let err = ws.run_operator(&at_def(0)).unwrap_err();
    assert!(matches!(err, Error::TensorNotFound { .. }));
    assert!(!err.is_fatal());
    assert!(ws.has_tensor("indices"));
}
