// End-to-end behaviour of dense arrays: construction, access, reshape,
// views and copies.

use tessera_core::{Array, DType, DenseArray, ErrorKind, NdArray, Shape};
use test_log::test;

fn iota_i32(shape: impl Into<Shape>) -> DenseArray<i32> {
    let shape = shape.into();
    let data = (0..shape.length() as i32).collect();
    DenseArray::from_vec(shape, data).unwrap()
}

// Construction

#[test]
fn test_zero_array_single_write() {
    let mut a = DenseArray::<i32>::zeros((2, 3, 4, 5));
    a.set(1, 2, 3, 4, 7).unwrap();
    assert_eq!(a.get(1, 2, 3, 4).unwrap(), 7);

    let mut others = 0;
    for k in 0..2 {
        for c in 0..3 {
            for r in 0..4 {
                for col in 0..5 {
                    if (k, c, r, col) != (1, 2, 3, 4) {
                        assert_eq!(a.get(k, c, r, col).unwrap(), 0);
                        others += 1;
                    }
                }
            }
        }
    }
    assert_eq!(others, 119);
}

#[test]
fn test_2d_literal() {
    let a = DenseArray::<i32>::from_2d(&[[1i32, 2, 3], [4, 5, 6]]).unwrap();
    assert_eq!(a.rank(), 2);
    assert_eq!(a.shape(), &Shape::new(1, 1, 2, 3));
    assert_eq!(a.get(0, 0, 1, 2).unwrap(), 6);
    assert_eq!(a.rows(), 2);
    assert_eq!(a.columns(), 3);
}

#[test]
fn test_literal_ranks() {
    let v = DenseArray::<f64>::from_1d(&[1.0f64, 2.0, 3.0]);
    assert_eq!((v.rank(), v.columns(), v.rows()), (1, 3, 1));

    let c = DenseArray::<f64>::from_3d(&[[[1.0f64]], [[2.0]], [[3.0]]]).unwrap();
    assert_eq!((c.rank(), c.channels(), c.kernels()), (3, 3, 1));

    let k = DenseArray::<f64>::from_4d(&[[[[1.0f64, 2.0]]], [[[3.0, 4.0]]]]).unwrap();
    assert_eq!(k.rank(), 4);
    assert_eq!(k.shape().dims(), vec![2, 1, 1, 2]);
    assert_eq!(k.get(1, 0, 0, 1).unwrap(), 4.0);
}

#[test]
fn test_jagged_literal_is_invalid_argument() {
    let kernels = vec![
        vec![vec![vec![1i32, 2]]],
        vec![vec![vec![3, 4]], vec![vec![5, 6]]],
    ];
    let err = DenseArray::<i32>::from_4d(&kernels).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// Access

#[test]
fn test_set_get_both_overloads() {
    let mut a = DenseArray::<i32>::zeros((2, 2));
    a.set(0, 0, 0, 1, 9).unwrap();
    a.set_f64(0, 0, 1, 0, 9.99).unwrap();
    a.set_f64(0, 0, 1, 1, -9.99).unwrap();
    assert_eq!(a.get(0, 0, 0, 1).unwrap(), 9);
    assert_eq!(a.get(0, 0, 1, 0).unwrap(), 9);
    assert_eq!(a.get(0, 0, 1, 1).unwrap(), -9);
    assert_eq!(a.get_f64(0, 0, 1, 1).unwrap(), -9.0);
}

#[test]
fn test_out_of_range_is_invalid_argument() {
    let mut a = DenseArray::<f32>::zeros((2, 3, 4, 5));
    let err = a.get(0, 3, 0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = a.set(0, 0, 0, 5, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_capabilities() {
    let a = DenseArray::<f32>::zeros(4);
    assert!(a.is_dense());
    assert!(a.is_numeric());
    assert_eq!(a.dtype(), DType::F32);
}

// Reshape

#[test]
fn test_identity_reshape() {
    let mut a = iota_i32((2, 3, 2, 2));
    let before = a.deep_clone().unwrap();
    let shape = *a.shape();
    a.reshape(shape).unwrap();
    assert_eq!(a, before);
}

#[test]
fn test_reshape_round_trip() {
    let s1 = Shape::new(2, 3, 2, 2);
    let s2 = Shape::from((4, 6));
    let mut a = iota_i32(s1);
    let original = a.deep_clone().unwrap();
    a.reshape(s2).unwrap().reshape(s1).unwrap();
    assert_eq!(a, original);
}

#[test]
fn test_reshape_mismatch_leaves_array_unchanged() {
    let mut a = iota_i32((3, 4));
    let err = a.reshape(Shape::from((5, 2))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    assert_eq!(a.shape(), &Shape::from((3, 4)));
    assert_eq!(a.to_vec().unwrap(), (0..12).collect::<Vec<i32>>());
}

#[test]
fn test_reshape_does_not_leak_into_shape_holders() {
    let mut a = iota_i32((2, 6));
    let held = *a.shape();
    a.reshape(Shape::from((3, 4))).unwrap();
    assert_eq!(held, Shape::from((2, 6)));
    assert_eq!(a.shape(), &Shape::from((3, 4)));
}

#[test]
fn test_reshape_view_in_place() {
    let a = iota_i32((2, 2, 3));
    let mut view = a.slice_range(0, 1, 1, 2).unwrap();
    view.reshape(Shape::from((3, 2))).unwrap();
    assert_eq!(view.to_vec().unwrap(), vec![6, 7, 8, 9, 10, 11]);
    assert_eq!(view.get(0, 0, 2, 0).unwrap(), 10);
}

// Views and copies

#[test]
fn test_slice_view_writes_reach_source() {
    let mut a = iota_i32((3, 2, 2));
    let mut view = a.slice(1).unwrap();
    view.set(0, 0, 1, 1, 100).unwrap();
    assert_eq!(a.get(0, 1, 1, 1).unwrap(), 100);
    a.set(0, 1, 0, 0, -5).unwrap();
    assert_eq!(view.get(0, 0, 0, 0).unwrap(), -5);
}

#[test]
fn test_set_slice_is_a_copy() {
    let mut a = DenseArray::<i32>::zeros((2, 2, 2));
    let mut other = iota_i32((2, 2));
    a.set_slice(1, &other).unwrap();
    other.set(0, 0, 0, 0, 50).unwrap();
    assert_eq!(a.get(0, 1, 0, 0).unwrap(), 0);
    assert_eq!(a.get(0, 1, 1, 1).unwrap(), 3);
}

#[test]
fn test_snapshot_through_fresh_target() {
    let source = iota_i32((2, 2, 2));
    let view = source.slice(0).unwrap();
    let mut snapshot = DenseArray::<i32>::zeros((2, 2));
    snapshot.set_slice(0, &view).unwrap();
    assert!(!snapshot.shares_storage(&source));
    assert_eq!(snapshot.to_vec().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_slice_range_length_and_origin() {
    let a = iota_i32((4, 3, 2, 5));
    let (sk, sc, ek, ec) = (1, 1, 3, 3);
    let view = a.slice_range(sk, sc, ek, ec).unwrap();
    assert_eq!(view.length(), (ek - sk) * (ec - sc) * a.matrix_length());
    for r in 0..2 {
        for col in 0..5 {
            assert_eq!(
                view.get(0, 0, r, col).unwrap(),
                a.get(sk, sc, r, col).unwrap()
            );
        }
    }
    assert_eq!(view.get(1, 1, 1, 4).unwrap(), a.get(2, 2, 1, 4).unwrap());
}

#[test]
fn test_slice_range_bad_range() {
    let a = iota_i32((2, 2, 2, 2));
    let err = a.slice_range(1, 0, 1, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_set_slice_wrong_shape() {
    let mut a = DenseArray::<i32>::zeros((2, 2, 2));
    let other = DenseArray::<i32>::zeros((1, 4));
    let err = a.set_slice(0, &other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

// Runtime kinds

#[test]
fn test_tagged_cross_kind_set_slice() {
    let mut batch = Array::zeros((2, 2, 3), DType::F32);
    let sample = Array::from(DenseArray::<i32>::from_2d(&[[1i32, 2], [3, 4]]).unwrap());
    let padded = sample.pad_post(2, 3).unwrap();
    batch.set_slice(1, &padded).unwrap();
    assert_eq!(
        batch.to_f64_vec().unwrap(),
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0]
    );
}
