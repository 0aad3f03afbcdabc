use std::fmt;

use tessera_core::{DType, Error, Result, WithDType};

// External tensors: The narrow capability an outside runtime must expose
//
// Inference runtimes, file readers and FFI buffers all describe their data
// the same way: an element type tag, a dimension list (outermost first) and
// a way to copy the elements out in row-major order. That is the whole
// contract. Anything that can answer these three questions can be turned
// into an `Array`.

/// Element type tags as external runtimes report them.
///
/// This is wider than [`DType`]: runtimes also carry booleans, strings and
/// complex numbers, which have no dense counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorDataType {
    Float,
    Double,
    Half,
    BFloat16,
    UInt8,
    Int32,
    Int64,
    Bool,
    String,
    Complex64,
}

impl TensorDataType {
    /// Bytes per element in a packed buffer, `None` for variable-width tags.
    pub fn size_in_bytes(&self) -> Option<usize> {
        match self {
            TensorDataType::Bool | TensorDataType::UInt8 => Some(1),
            TensorDataType::Half | TensorDataType::BFloat16 => Some(2),
            TensorDataType::Float | TensorDataType::Int32 => Some(4),
            TensorDataType::Double | TensorDataType::Int64 | TensorDataType::Complex64 => Some(8),
            TensorDataType::String => None,
        }
    }
}

impl fmt::Display for TensorDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TensorDataType::Float => "FLOAT",
            TensorDataType::Double => "DOUBLE",
            TensorDataType::Half => "FLOAT16",
            TensorDataType::BFloat16 => "BFLOAT16",
            TensorDataType::UInt8 => "UINT8",
            TensorDataType::Int32 => "INT32",
            TensorDataType::Int64 => "INT64",
            TensorDataType::Bool => "BOOL",
            TensorDataType::String => "STRING",
            TensorDataType::Complex64 => "COMPLEX64",
        };
        write!(f, "{}", s)
    }
}

impl From<DType> for TensorDataType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::F16 => TensorDataType::Half,
            DType::BF16 => TensorDataType::BFloat16,
            DType::F32 => TensorDataType::Float,
            DType::F64 => TensorDataType::Double,
            DType::U8 => TensorDataType::UInt8,
            DType::I32 => TensorDataType::Int32,
            DType::I64 => TensorDataType::Int64,
        }
    }
}

impl TryFrom<TensorDataType> for DType {
    type Error = Error;

    fn try_from(data_type: TensorDataType) -> Result<Self> {
        match data_type {
            TensorDataType::Half => Ok(DType::F16),
            TensorDataType::BFloat16 => Ok(DType::BF16),
            TensorDataType::Float => Ok(DType::F32),
            TensorDataType::Double => Ok(DType::F64),
            TensorDataType::UInt8 => Ok(DType::U8),
            TensorDataType::Int32 => Ok(DType::I32),
            TensorDataType::Int64 => Ok(DType::I64),
            TensorDataType::Bool | TensorDataType::String | TensorDataType::Complex64 => {
                Err(Error::UnsupportedElementType(data_type.to_string()))
            }
        }
    }
}

/// A tensor owned by something outside tessera.
pub trait ExternalTensor {
    /// The element type tag.
    fn data_type(&self) -> TensorDataType;

    /// Dimension sizes, outermost first. An empty slice is a scalar.
    fn shape(&self) -> &[usize];

    /// Copy every element, in row-major order, into `out`, converting to
    /// `T` through the coercion table. `out.len()` must equal
    /// [`ExternalTensor::num_elements`].
    fn copy_to<T: WithDType>(&self, out: &mut [T]) -> Result<()>;

    fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }
}
