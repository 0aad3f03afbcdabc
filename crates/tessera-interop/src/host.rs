use half::{bf16, f16};

use tessera_core::{bail, DType, Error, Result, Shape, WithDType};

use crate::external::{ExternalTensor, TensorDataType};

// HostTensor: An owned, packed external tensor
//
// The buffer layout is the one most runtimes and file formats share:
//
//   data_type   element tag
//   dims        dimension sizes, outermost first
//   bytes       elements in row-major order, little-endian, no padding
//
// `to_external` produces these; tests and callers without a runtime of
// their own use them as an `ExternalTensor`.

/// An in-memory tensor in packed little-endian form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTensor {
    data_type: TensorDataType,
    dims: Vec<usize>,
    bytes: Vec<u8>,
}

impl HostTensor {
    /// Pack `values` (row-major) under `dims`.
    pub fn from_slice<T: WithDType>(dims: &[usize], values: &[T]) -> Result<Self> {
        let expected = Shape::element_count(dims)?;
        if values.len() != expected {
            bail!(
                "dims {:?} require {} elements, got {}",
                dims,
                expected,
                values.len()
            );
        }
        Ok(HostTensor {
            data_type: TensorDataType::from(T::DTYPE),
            dims: dims.to_vec(),
            bytes: encode(values),
        })
    }

    /// Wrap an already packed buffer. The tag must have a fixed width and
    /// the buffer must hold exactly one element per position.
    pub fn from_bytes(data_type: TensorDataType, dims: &[usize], bytes: Vec<u8>) -> Result<Self> {
        let width = data_type
            .size_in_bytes()
            .ok_or_else(|| Error::UnsupportedElementType(data_type.to_string()))?;
        let expected = Shape::element_count(dims)?
            .checked_mul(width)
            .ok_or_else(|| Error::DimensionOverflow {
                dims: dims.to_vec(),
            })?;
        if bytes.len() != expected {
            return Err(Error::msg(format!(
                "{} buffer for dims {:?} must be {} bytes, got {}",
                data_type,
                dims,
                expected,
                bytes.len()
            )));
        }
        Ok(HostTensor {
            data_type,
            dims: dims.to_vec(),
            bytes,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl ExternalTensor for HostTensor {
    fn data_type(&self) -> TensorDataType {
        self.data_type
    }

    fn shape(&self) -> &[usize] {
        &self.dims
    }

    fn copy_to<T: WithDType>(&self, out: &mut [T]) -> Result<()> {
        let n = self.num_elements();
        if out.len() != n {
            return Err(Error::msg(format!(
                "copy_to: destination holds {} elements, tensor has {}",
                out.len(),
                n
            )));
        }
        let bytes = self.bytes.as_slice();
        match self.data_type {
            TensorDataType::Half => decode(bytes, out, f16::from_le_bytes),
            TensorDataType::BFloat16 => decode(bytes, out, bf16::from_le_bytes),
            TensorDataType::Float => decode(bytes, out, f32::from_le_bytes),
            TensorDataType::Double => decode(bytes, out, f64::from_le_bytes),
            TensorDataType::UInt8 => decode(bytes, out, |b: [u8; 1]| b[0]),
            TensorDataType::Int32 => decode(bytes, out, i32::from_le_bytes),
            TensorDataType::Int64 => decode(bytes, out, i64::from_le_bytes),
            TensorDataType::Bool | TensorDataType::String | TensorDataType::Complex64 => {
                return Err(Error::UnsupportedElementType(self.data_type.to_string()))
            }
        }
        Ok(())
    }
}

fn encode<T: WithDType>(values: &[T]) -> Vec<u8> {
    match T::DTYPE {
        DType::F16 => values
            .iter()
            .flat_map(|&v| f16::coerce_from(v).to_le_bytes())
            .collect(),
        DType::BF16 => values
            .iter()
            .flat_map(|&v| bf16::coerce_from(v).to_le_bytes())
            .collect(),
        DType::F32 => values
            .iter()
            .flat_map(|&v| f32::coerce_from(v).to_le_bytes())
            .collect(),
        DType::F64 => values
            .iter()
            .flat_map(|&v| f64::coerce_from(v).to_le_bytes())
            .collect(),
        DType::U8 => values.iter().map(|&v| u8::coerce_from(v)).collect(),
        DType::I32 => values
            .iter()
            .flat_map(|&v| i32::coerce_from(v).to_le_bytes())
            .collect(),
        DType::I64 => values
            .iter()
            .flat_map(|&v| i64::coerce_from(v).to_le_bytes())
            .collect(),
    }
}

fn decode<S, T, const N: usize>(bytes: &[u8], out: &mut [T], read: fn([u8; N]) -> S)
where
    S: WithDType,
    T: WithDType,
{
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(N)) {
        let mut raw = [0u8; N];
        raw.copy_from_slice(chunk);
        *slot = T::coerce_from(read(raw));
    }
}
