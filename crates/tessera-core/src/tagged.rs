use half::{bf16, f16};

use crate::array::NdArray;
use crate::dense::DenseArray;
use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::shape::Shape;

// Array: A dense array whose element kind is only known at runtime
//
// Interop and data pipelines receive arrays whose kind is a runtime tag
// (an external dtype, a config value). `Array` closes over every dense kind
// and dispatches on the variant. Kind-specific behaviour always comes from
// the WithDType coercion table; nothing here inspects concrete types.

/// One dense array of any supported element kind.
#[derive(Debug, PartialEq)]
pub enum Array {
    F16(DenseArray<f16>),
    BF16(DenseArray<bf16>),
    F32(DenseArray<f32>),
    F64(DenseArray<f64>),
    U8(DenseArray<u8>),
    I32(DenseArray<i32>),
    I64(DenseArray<i64>),
}

/// Run `$body` with `$a` bound to the inner DenseArray, whatever its kind.
macro_rules! dispatch {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            Array::F16($a) => $body,
            Array::BF16($a) => $body,
            Array::F32($a) => $body,
            Array::F64($a) => $body,
            Array::U8($a) => $body,
            Array::I32($a) => $body,
            Array::I64($a) => $body,
        }
    };
}

/// Element kinds that have an [`Array`] variant.
pub trait DenseKind: WithDType {
    fn wrap(array: DenseArray<Self>) -> Array;
    fn unwrap_ref(array: &Array) -> Option<&DenseArray<Self>>;
    fn unwrap_mut(array: &mut Array) -> Option<&mut DenseArray<Self>>;
    fn unwrap(array: Array) -> std::result::Result<DenseArray<Self>, Array>;
}

macro_rules! dense_kind {
    ($t:ty, $variant:ident) => {
        impl DenseKind for $t {
            fn wrap(array: DenseArray<Self>) -> Array {
                Array::$variant(array)
            }
            fn unwrap_ref(array: &Array) -> Option<&DenseArray<Self>> {
                match array {
                    Array::$variant(a) => Some(a),
                    _ => None,
                }
            }
            fn unwrap_mut(array: &mut Array) -> Option<&mut DenseArray<Self>> {
                match array {
                    Array::$variant(a) => Some(a),
                    _ => None,
                }
            }
            fn unwrap(array: Array) -> std::result::Result<DenseArray<Self>, Array> {
                match array {
                    Array::$variant(a) => Ok(a),
                    other => Err(other),
                }
            }
        }

        impl From<DenseArray<$t>> for Array {
            fn from(array: DenseArray<$t>) -> Self {
                Array::$variant(array)
            }
        }
    };
}

dense_kind!(f16, F16);
dense_kind!(bf16, BF16);
dense_kind!(f32, F32);
dense_kind!(f64, F64);
dense_kind!(u8, U8);
dense_kind!(i32, I32);
dense_kind!(i64, I64);

impl Array {
    /// Zero-filled array of the given kind.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape = shape.into();
        match dtype {
            DType::F16 => Array::F16(DenseArray::zeros(shape)),
            DType::BF16 => Array::BF16(DenseArray::zeros(shape)),
            DType::F32 => Array::F32(DenseArray::zeros(shape)),
            DType::F64 => Array::F64(DenseArray::zeros(shape)),
            DType::U8 => Array::U8(DenseArray::zeros(shape)),
            DType::I32 => Array::I32(DenseArray::zeros(shape)),
            DType::I64 => Array::I64(DenseArray::zeros(shape)),
        }
    }

    /// Build an array of kind `dtype` from f64 values, coercing each one.
    pub fn from_f64_vec(shape: impl Into<Shape>, data: &[f64], dtype: DType) -> Result<Self> {
        fn build<T: DenseKind>(shape: Shape, data: &[f64]) -> Result<Array> {
            let values = data.iter().map(|&v| T::from_f64(v)).collect();
            Ok(T::wrap(DenseArray::from_vec(shape, values)?))
        }
        let shape = shape.into();
        match dtype {
            DType::F16 => build::<f16>(shape, data),
            DType::BF16 => build::<bf16>(shape, data),
            DType::F32 => build::<f32>(shape, data),
            DType::F64 => build::<f64>(shape, data),
            DType::U8 => build::<u8>(shape, data),
            DType::I32 => build::<i32>(shape, data),
            DType::I64 => build::<i64>(shape, data),
        }
    }

    pub fn dtype(&self) -> DType {
        dispatch!(self, a => a.dtype())
    }

    pub fn shape(&self) -> &Shape {
        dispatch!(self, a => a.shape())
    }

    pub fn get_f64(&self, kernel: usize, channel: usize, row: usize, column: usize) -> Result<f64> {
        dispatch!(self, a => a.get_f64(kernel, channel, row, column))
    }

    pub fn set_f64(
        &mut self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
        value: f64,
    ) -> Result<()> {
        dispatch!(self, a => a.set_f64(kernel, channel, row, column, value))
    }

    pub fn get_linear_f64(&self, index: usize) -> Result<f64> {
        dispatch!(self, a => a.get_linear_f64(index))
    }

    pub fn reshape(&mut self, new_shape: Shape) -> Result<&mut Self> {
        dispatch!(&mut *self, a => { a.reshape(new_shape)?; });
        Ok(self)
    }

    /// View over slice `index` (shares storage).
    pub fn slice(&self, index: usize) -> Result<Array> {
        dispatch!(self, a => Ok(a.slice(index)?.into()))
    }

    /// View over a kernel/channel sub-range (shares storage).
    pub fn slice_range(
        &self,
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
    ) -> Result<Array> {
        dispatch!(self, a => Ok(a
            .slice_range(start_kernel, start_channel, end_kernel, end_channel)?
            .into()))
    }

    /// Copy `slice` into slice position `index`.
    ///
    /// Same kind: bulk copy. Different kind: each value goes through the
    /// coercion table of `self`'s kind.
    pub fn set_slice(&mut self, index: usize, slice: &Array) -> Result<&mut Self> {
        match (&mut *self, slice) {
            (Array::F16(dst), Array::F16(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::BF16(dst), Array::BF16(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::F32(dst), Array::F32(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::F64(dst), Array::F64(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::U8(dst), Array::U8(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::I32(dst), Array::I32(src)) => {
                dst.set_slice(index, src)?;
            }
            (Array::I64(dst), Array::I64(src)) => {
                dst.set_slice(index, src)?;
            }
            (dst, src) => {
                dispatch!(dst, d => dispatch!(src, s => { d.set_slice_coerced(index, s)?; }));
            }
        }
        Ok(self)
    }

    pub fn pad_post(&self, rows: usize, columns: usize) -> Result<Array> {
        dispatch!(self, a => Ok(a.pad_post(rows, columns)?.into()))
    }

    pub fn deep_clone(&self) -> Result<Array> {
        dispatch!(self, a => Ok(a.deep_clone()?.into()))
    }

    /// All elements widened to f64, in logical row-major order.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        dispatch!(self, a => a.to_f64_vec())
    }

    /// Copy into a new array of kind `dtype`.
    pub fn to_dtype(&self, dtype: DType) -> Result<Array> {
        Array::from_f64_vec(*self.shape(), &self.to_f64_vec()?, dtype)
    }

    /// Borrow the inner array as kind `T`.
    pub fn as_dense<T: DenseKind>(&self) -> Result<&DenseArray<T>> {
        T::unwrap_ref(self).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    pub fn as_dense_mut<T: DenseKind>(&mut self) -> Result<&mut DenseArray<T>> {
        let got = self.dtype();
        T::unwrap_mut(self).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got,
        })
    }

    pub fn into_dense<T: DenseKind>(self) -> Result<DenseArray<T>> {
        T::unwrap(self).map_err(|other| Error::DTypeMismatch {
            expected: T::DTYPE,
            got: other.dtype(),
        })
    }

    // Shape introspection

    pub fn rank(&self) -> usize {
        self.shape().rank()
    }

    pub fn length(&self) -> usize {
        self.shape().length()
    }

    pub fn is_dense(&self) -> bool {
        true
    }

    pub fn is_numeric(&self) -> bool {
        true
    }
}
