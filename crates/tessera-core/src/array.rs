use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::shape::Shape;

// NdArray: The capability surface every array implementation provides
//
// Everything above the storage engine (batching, datasets, model code) talks
// to arrays through this trait. The element kind is an associated type, so
// a caller holding `impl NdArray<Elem = f32>` gets typed reads and writes
// without knowing the storage, while `get_f64` / `set_f64` give a
// kind-independent numeric view for cross-kind code.
//
// Two families of operations deserve care:
//
//   - slice / slice_range return *views*: the result shares storage with
//     `self` and writes through either are visible through both.
//   - set_slice / set_slice_from *copy*: after the call the target owns its
//     values and later changes to the argument do not reach it.
//
// reshape and set_slice validate everything before touching storage, so an
// `Err` means nothing was written.

/// A dense-or-not, rank ≤ 4 array of one element kind.
pub trait NdArray {
    /// The element kind.
    type Elem: WithDType;

    /// The shape currently bound to this array.
    fn shape(&self) -> &Shape;

    /// Typed read of element (kernel, channel, row, column).
    fn get(&self, kernel: usize, channel: usize, row: usize, column: usize)
        -> Result<Self::Elem>;

    /// Typed write of element (kernel, channel, row, column).
    fn set(
        &mut self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
        value: Self::Elem,
    ) -> Result<()>;

    /// Whether the storage is dense (every coordinate backed by memory).
    fn is_dense(&self) -> bool;

    /// Redistribute the elements into `new_shape` (same length) in row-major
    /// order.
    fn reshape(&mut self, new_shape: Shape) -> Result<&mut Self>
    where
        Self: Sized;

    /// View over the single slice at `index`, shaped (rows, columns).
    fn slice(&self, index: usize) -> Result<Self>
    where
        Self: Sized;

    /// View over kernels `[start_kernel, end_kernel)` and channels
    /// `[start_channel, end_channel)`.
    fn slice_range(
        &self,
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
    ) -> Result<Self>
    where
        Self: Sized;

    /// Copy `slice` into slice position `index`. Implementations provide a
    /// bulk copy for their own type.
    fn set_slice(&mut self, index: usize, slice: &Self) -> Result<&mut Self>
    where
        Self: Sized;

    //  Provided

    /// Element-kind tag.
    fn dtype(&self) -> DType {
        Self::Elem::DTYPE
    }

    fn is_numeric(&self) -> bool {
        true
    }

    /// Widening numeric read.
    fn get_f64(&self, kernel: usize, channel: usize, row: usize, column: usize) -> Result<f64> {
        Ok(self.get(kernel, channel, row, column)?.to_f64())
    }

    /// Coercing numeric write (see [`WithDType::from_f64`] for the rule).
    fn set_f64(
        &mut self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
        value: f64,
    ) -> Result<()> {
        self.set(kernel, channel, row, column, Self::Elem::from_f64(value))
    }

    /// Widening read of the element at global row-major position `index`.
    fn get_linear_f64(&self, index: usize) -> Result<f64> {
        let shape = *self.shape();
        if index >= shape.length() {
            return Err(Error::msg(format!(
                "linear index {} out of bounds for shape {}",
                index, shape
            )));
        }
        let slice = shape.to_slice_index(index);
        let matrix = shape.to_matrix_index(index);
        let columns = shape.columns();
        self.get_f64(
            slice / shape.channels(),
            slice % shape.channels(),
            matrix / columns,
            matrix % columns,
        )
    }

    /// Copy any array of the same element kind into slice position `index`,
    /// one element at a time.
    ///
    /// This is the generic path for sources that are not `Self`; it performs
    /// the same validation as [`NdArray::set_slice`]. The source is read in
    /// full before the first write, so a source aliasing `self` is safe.
    fn set_slice_from<A>(&mut self, index: usize, slice: &A) -> Result<&mut Self>
    where
        Self: Sized,
        A: NdArray<Elem = Self::Elem> + ?Sized,
    {
        let shape = *self.shape();
        let expected = shape.matrix_shape();
        if *slice.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: *slice.shape(),
            });
        }
        if index >= shape.slice_length() {
            return Err(Error::SliceOutOfRange {
                index,
                slices: shape.slice_length(),
            });
        }
        let mut values = Vec::with_capacity(shape.matrix_length());
        for row in 0..shape.rows() {
            for column in 0..shape.columns() {
                values.push(slice.get(0, 0, row, column)?);
            }
        }
        let (kernel, channel) = (index / shape.channels(), index % shape.channels());
        for (i, value) in values.into_iter().enumerate() {
            self.set(
                kernel,
                channel,
                i / shape.columns(),
                i % shape.columns(),
                value,
            )?;
        }
        Ok(self)
    }

    //  Shape introspection

    fn kernels(&self) -> usize {
        self.shape().kernels()
    }

    fn channels(&self) -> usize {
        self.shape().channels()
    }

    fn rows(&self) -> usize {
        self.shape().rows()
    }

    fn columns(&self) -> usize {
        self.shape().columns()
    }

    fn rank(&self) -> usize {
        self.shape().rank()
    }

    fn length(&self) -> usize {
        self.shape().length()
    }

    fn slice_length(&self) -> usize {
        self.shape().slice_length()
    }

    fn matrix_length(&self) -> usize {
        self.shape().matrix_length()
    }
}
