use half::{bf16, f16};

use tessera_core::{Array, DType, DenseArray, DenseKind, Error, Result, Shape, WithDType};

use crate::external::ExternalTensor;
use crate::host::HostTensor;

// Conversion: External tensors in, host tensors out
//
// Import resolves the element kind first and the rank second:
//
//   rank 1  [n]           → (1, 1, 1, n)
//   rank 2  [r, c]        → (1, 1, r, c)
//   rank 3  [ch, r, c]    → one slice per channel
//   rank 4  [k, ch, r, c] → one slice per (kernel, channel)
//
// A rank-0 tensor becomes a single-element rank-1 array; anything above
// rank 4 is rejected before a single element is copied.

/// Options for [`to_external`].
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Element kind of the exported buffer. `None` keeps the array's kind.
    pub dtype: Option<DType>,
    /// Number of dimensions to emit (1 to 4). `None` keeps the array's rank.
    pub rank: Option<usize>,
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dtype(mut self, d: DType) -> Self {
        self.dtype = Some(d);
        self
    }

    pub fn rank(mut self, r: usize) -> Self {
        self.rank = Some(r);
        self
    }
}

/// Build an [`Array`] of the tensor's own kind.
pub fn from_external<E: ExternalTensor + ?Sized>(tensor: &E) -> Result<Array> {
    fn read_kind<T: DenseKind, E: ExternalTensor + ?Sized>(tensor: &E) -> Result<Array> {
        Ok(T::wrap(read(tensor)?))
    }
    match DType::try_from(tensor.data_type())? {
        DType::F16 => read_kind::<f16, E>(tensor),
        DType::BF16 => read_kind::<bf16, E>(tensor),
        DType::F32 => read_kind::<f32, E>(tensor),
        DType::F64 => read_kind::<f64, E>(tensor),
        DType::U8 => read_kind::<u8, E>(tensor),
        DType::I32 => read_kind::<i32, E>(tensor),
        DType::I64 => read_kind::<i64, E>(tensor),
    }
}

/// Build a [`DenseArray<T>`] from a tensor whose kind is known to be `T`.
///
/// The tensor's tag must map to exactly `T::DTYPE`; no coercion happens
/// here.
pub fn from_external_as<T: WithDType, E: ExternalTensor + ?Sized>(
    tensor: &E,
) -> Result<DenseArray<T>> {
    let got = DType::try_from(tensor.data_type())?;
    if got != T::DTYPE {
        return Err(Error::DTypeMismatch {
            expected: T::DTYPE,
            got,
        });
    }
    read(tensor)
}

fn read<T: WithDType, E: ExternalTensor + ?Sized>(tensor: &E) -> Result<DenseArray<T>> {
    let shape = Shape::from_dims(tensor.shape())?;
    let mut data = vec![T::zero(); shape.length()];
    tensor.copy_to(&mut data)?;
    log::debug!(
        "imported {} tensor {:?} as {} array {}",
        tensor.data_type(),
        tensor.shape(),
        T::DTYPE,
        shape
    );
    DenseArray::from_vec(shape, data)
}

/// Pack an [`Array`] into a [`HostTensor`].
///
/// With `config.dtype` set, values are coerced into that kind. With
/// `config.rank` set, leading axes are dropped or added; every dropped
/// axis must have size 1.
pub fn to_external(array: &Array, config: &ExportConfig) -> Result<HostTensor> {
    let dims = export_dims(array.shape(), config.rank)?;
    let target = config.dtype.unwrap_or_else(|| array.dtype());

    let converted;
    let source = if target == array.dtype() {
        array
    } else {
        converted = array.to_dtype(target)?;
        &converted
    };

    let tensor = match source {
        Array::F16(a) => pack(&dims, a)?,
        Array::BF16(a) => pack(&dims, a)?,
        Array::F32(a) => pack(&dims, a)?,
        Array::F64(a) => pack(&dims, a)?,
        Array::U8(a) => pack(&dims, a)?,
        Array::I32(a) => pack(&dims, a)?,
        Array::I64(a) => pack(&dims, a)?,
    };
    log::debug!(
        "exported {} array {} as {} tensor {:?}",
        array.dtype(),
        array.shape(),
        tensor.data_type(),
        dims
    );
    Ok(tensor)
}

fn pack<T: WithDType>(dims: &[usize], array: &DenseArray<T>) -> Result<HostTensor> {
    HostTensor::from_slice(dims, &array.to_vec()?)
}

fn export_dims(shape: &Shape, rank: Option<usize>) -> Result<Vec<usize>> {
    let Some(rank) = rank else {
        return Ok(shape.dims());
    };
    if rank == 0 || rank > 4 {
        return Err(Error::RankOutOfRange { rank });
    }
    let all = [shape.kernels(), shape.channels(), shape.rows(), shape.columns()];
    let (dropped, kept) = all.split_at(4 - rank);
    if dropped.iter().any(|&d| d != 1) {
        return Err(Error::ShapeMismatch {
            expected: Shape::from_dims(kept)?,
            got: *shape,
        });
    }
    Ok(kept.to_vec())
}
