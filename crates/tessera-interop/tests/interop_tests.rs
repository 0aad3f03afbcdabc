// Conversion between tessera arrays and external tensors, through both the
// packed HostTensor and a runtime-style tensor that stores its values its
// own way.

use tessera_core::{Array, DType, DenseArray, ErrorKind, NdArray, Result, Shape, WithDType};
use tessera_interop::{
    from_external, from_external_as, to_external, ExportConfig, ExternalTensor, HostTensor,
    TensorDataType,
};
use test_log::test;

/// A tensor that keeps its values as i64 regardless of the tag it reports,
/// the way a runtime wrapper over foreign memory might.
struct RuntimeTensor {
    tag: TensorDataType,
    dims: Vec<usize>,
    values: Vec<i64>,
}

impl ExternalTensor for RuntimeTensor {
    fn data_type(&self) -> TensorDataType {
        self.tag
    }

    fn shape(&self) -> &[usize] {
        &self.dims
    }

    fn copy_to<T: WithDType>(&self, out: &mut [T]) -> Result<()> {
        for (slot, &v) in out.iter_mut().zip(&self.values) {
            *slot = T::coerce_from(v);
        }
        Ok(())
    }
}

#[test]
fn test_rank1_int32() {
    let values: Vec<i32> = (0..7).map(|i| i * 3 - 5).collect();
    let t = HostTensor::from_slice(&[7], &values).unwrap();
    let array = from_external(&t).unwrap();
    assert_eq!(array.dtype(), DType::I32);
    assert_eq!(array.rank(), 1);
    assert_eq!(array.length(), 7);
    assert_eq!(*array.shape(), Shape::new(1, 1, 1, 7));

    let dense = array.as_dense::<i32>().unwrap();
    assert_eq!(dense.to_vec().unwrap(), values);
}

#[test]
fn test_ranks_preserve_axis_sizes() {
    for dims in [vec![3, 4], vec![2, 3, 4], vec![2, 3, 4, 5]] {
        let n: usize = dims.iter().product();
        let values: Vec<f32> = (0..n).map(|i| i as f32 * 0.5).collect();
        let t = HostTensor::from_slice(&dims, &values).unwrap();
        let array = from_external(&t).unwrap();
        assert_eq!(array.rank(), dims.len());
        assert_eq!(array.shape().dims(), dims);
        let widened: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        assert_eq!(array.to_f64_vec().unwrap(), widened);
    }
}

#[test]
fn test_rank3_one_slice_per_channel() {
    let t = HostTensor::from_slice(&[3, 1, 2], &[1u8, 2, 3, 4, 5, 6]).unwrap();
    let array = from_external(&t).unwrap();
    let dense = array.as_dense::<u8>().unwrap();
    assert_eq!(dense.slice_length(), 3);
    assert_eq!(dense.slice(2).unwrap().to_vec().unwrap(), vec![5, 6]);
    assert_eq!(dense.get(0, 1, 0, 1).unwrap(), 4);
}

#[test]
fn test_scalar_becomes_single_element() {
    let t = HostTensor::from_slice(&[], &[42i64]).unwrap();
    let array = from_external(&t).unwrap();
    assert_eq!(array.rank(), 1);
    assert_eq!(array.get_f64(0, 0, 0, 0).unwrap(), 42.0);
}

#[test]
fn test_unsupported_dtype() {
    let t = HostTensor::from_bytes(TensorDataType::Bool, &[2, 2], vec![0, 1, 1, 0]).unwrap();
    let err = from_external(&t).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedElementType);

    let runtime = RuntimeTensor {
        tag: TensorDataType::Complex64,
        dims: vec![1],
        values: vec![0],
    };
    let err = from_external(&runtime).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedElementType);
}

#[test]
fn test_rank5_is_invalid_argument() {
    let t = HostTensor::from_slice(&[1, 1, 1, 1, 2], &[1.0f64, 2.0]).unwrap();
    let err = from_external(&t).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_overflowing_dims_are_invalid_argument() {
    let runtime = RuntimeTensor {
        tag: TensorDataType::Float,
        dims: vec![1 << 32, 1 << 32],
        values: vec![],
    };
    let err = from_external(&runtime).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = from_external_as::<f32, _>(&runtime).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_i64_survives_import_and_export() {
    let big = [(1i64 << 53) + 1, i64::MAX - 1];
    let array = Array::from(DenseArray::<i64>::from_1d(&big));
    let t = to_external(&array, &ExportConfig::default()).unwrap();
    let back = from_external_as::<i64, _>(&t).unwrap();
    assert_eq!(back.to_vec().unwrap(), big.to_vec());
}

#[test]
fn test_runtime_tensor() {
    let runtime = RuntimeTensor {
        tag: TensorDataType::Int64,
        dims: vec![2, 2],
        values: vec![10, 20, 30, 40],
    };
    let dense: DenseArray<i64> = from_external_as(&runtime).unwrap();
    assert_eq!(dense.get(0, 0, 1, 0).unwrap(), 30);

    let err = from_external_as::<i32, _>(&runtime).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedElementType);
}

#[test]
fn test_export_round_trip() {
    let source = DenseArray::<i32>::from_3d(&[[[1i32, 2], [3, 4]], [[5, 6], [7, 8]]]).unwrap();
    let array = Array::from(source);
    let t = to_external(&array, &ExportConfig::default()).unwrap();
    assert_eq!(t.shape(), &[2, 2, 2]);
    assert_eq!(t.data_type(), TensorDataType::Int32);
    assert_eq!(from_external(&t).unwrap(), array);
}

#[test]
fn test_export_view_and_rank() {
    let values: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let array = Array::from_f64_vec((2, 3, 2, 2), &values, DType::F32).unwrap();
    let view = array.slice_range(1, 2, 2, 3).unwrap();
    let t = to_external(&view, &ExportConfig::new().rank(2).dtype(DType::F64)).unwrap();
    assert_eq!(t.shape(), &[2, 2]);
    let mut out = [0f64; 4];
    t.copy_to(&mut out).unwrap();
    assert_eq!(out, [20.0, 21.0, 22.0, 23.0]);

    let err = to_external(&array, &ExportConfig::new().rank(2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}
