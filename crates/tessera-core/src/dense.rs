use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::array::NdArray;
use crate::dtype::WithDType;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

// DenseArray: Dense storage for one element kind
//
// A DenseArray is a handle made of two parts:
//
//   1. an *arena*: one contiguous Vec<T>, behind Arc<RwLock<..>>
//   2. a *layout*: the shape bound to this handle plus the arena offset of
//      each (kernel, channel) slice
//
// MEMORY MODEL:
//
//   Freshly built arrays own their arena alone and have a contiguous layout.
//   slice() and slice_range() build a new handle over the *same* arena
//   (Arc::clone) with a layout that points at the selected slices, so
//   writes through a view are visible through the source and vice versa.
//
//   There is no Clone impl. deep_clone() gives an independent copy; a slice
//   view gives a shared one.
//
//   reshape() builds a brand new arena and swaps it in. Views taken before
//   the reshape keep the old arena (and the old values); they no longer
//   alias the reshaped array.
//
// LOCKING:
//
//   Every read takes the read lock and every write the write lock for the
//   duration of one call. Concurrent readers are fine; concurrent writers to
//   the same slice must still be serialized by the caller.

/// Dense, rank ≤ 4 array of element kind `T`.
pub struct DenseArray<T: WithDType> {
    /// The arena, shared with every view of this array.
    storage: Arc<RwLock<Vec<T>>>,
    /// Shape plus per-slice arena offsets.
    layout: Layout,
}

impl<T: WithDType> DenseArray<T> {
    // Internal constructors

    fn from_parts(data: Vec<T>, shape: Shape) -> Self {
        DenseArray {
            storage: Arc::new(RwLock::new(data)),
            layout: Layout::contiguous(shape),
        }
    }

    /// A new handle over this array's arena with a different layout.
    fn view_with_layout(&self, layout: Layout) -> Self {
        log::trace!(
            "view {} over {} arena offsets of {}",
            layout.shape(),
            layout.offsets().len(),
            self.layout.shape()
        );
        DenseArray {
            storage: Arc::clone(&self.storage),
            layout,
        }
    }

    fn read_storage(&self) -> Result<RwLockReadGuard<'_, Vec<T>>> {
        self.storage
            .read()
            .map_err(|_| Error::LockPoisoned)
    }

    fn write_storage(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>> {
        self.storage
            .write()
            .map_err(|_| Error::LockPoisoned)
    }

    // Creation methods

    /// Create an array filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        Self::from_parts(vec![T::zero(); shape.length()], shape)
    }

    /// Create an array from row-major data.
    pub fn from_vec(shape: impl Into<Shape>, data: Vec<T>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.length() {
            return Err(Error::ElementCountMismatch {
                shape,
                expected: shape.length(),
                got: data.len(),
            });
        }
        Ok(Self::from_parts(data, shape))
    }

    /// Rank-1 array: one slice, one row.
    ///
    /// ```ignore
    /// let v = DenseArray::<f32>::from_1d(&[1, 2, 3]);
    /// assert_eq!(v.shape(), &Shape::from(3));
    /// ```
    pub fn from_1d<S: WithDType>(values: &[S]) -> Self {
        let data = values.iter().map(|&v| T::coerce_from(v)).collect();
        Self::from_parts(data, Shape::from(values.len()))
    }

    /// Rank-2 array from a list of rows.
    ///
    /// The column count is taken from the first row; every other row must
    /// have the same length, otherwise [`Error::JaggedLiteral`].
    pub fn from_2d<S, R>(rows: &[R]) -> Result<Self>
    where
        S: WithDType,
        R: AsRef<[S]>,
    {
        let columns = uniform_len(rows, 1)?;
        let shape = Shape::from((rows.len(), columns));
        let mut data = Vec::with_capacity(shape.length());
        for row in rows {
            data.extend(row.as_ref().iter().map(|&v| T::coerce_from(v)));
        }
        Ok(Self::from_parts(data, shape))
    }

    /// Rank-3 array: one slice per channel, matrix shape from the first
    /// channel. All channels must share that shape.
    pub fn from_3d<S, R, C>(channels: &[C]) -> Result<Self>
    where
        S: WithDType,
        R: AsRef<[S]>,
        C: AsRef<[R]>,
    {
        let rows = uniform_len(channels, 1)?;
        let columns = first_len(
            channels
                .iter()
                .flat_map(|c| c.as_ref())
                .map(|r| r.as_ref()),
            2,
        )?;
        let shape = Shape::from((channels.len(), rows, columns));
        let mut data = Vec::with_capacity(shape.length());
        for channel in channels {
            for row in channel.as_ref() {
                data.extend(row.as_ref().iter().map(|&v| T::coerce_from(v)));
            }
        }
        Ok(Self::from_parts(data, shape))
    }

    /// Rank-4 array: one slice per (kernel, channel) pair. Dimensions come
    /// from the first sub-array at each level and are validated against all
    /// siblings.
    pub fn from_4d<S, R, C, K>(kernels: &[K]) -> Result<Self>
    where
        S: WithDType,
        R: AsRef<[S]>,
        C: AsRef<[R]>,
        K: AsRef<[C]>,
    {
        let channels = uniform_len(kernels, 1)?;
        let rows = first_len(
            kernels
                .iter()
                .flat_map(|k| k.as_ref())
                .map(|c| c.as_ref()),
            2,
        )?;
        let columns = first_len(
            kernels
                .iter()
                .flat_map(|k| k.as_ref())
                .flat_map(|c| c.as_ref())
                .map(|r| r.as_ref()),
            3,
        )?;
        let shape = Shape::new(kernels.len(), channels, rows, columns);
        let mut data = Vec::with_capacity(shape.length());
        for kernel in kernels {
            for channel in kernel.as_ref() {
                for row in channel.as_ref() {
                    data.extend(row.as_ref().iter().map(|&v| T::coerce_from(v)));
                }
            }
        }
        Ok(Self::from_parts(data, shape))
    }

    // Accessors

    /// The memory layout (shape + slice offsets).
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether this array's slices are laid out in order from arena offset 0.
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Whether `self` and `other` read and write the same arena.
    pub fn shares_storage(&self, other: &DenseArray<T>) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Whether any other handle (a view or the array a view came from)
    /// currently shares this arena.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.storage) > 1
    }

    /// All elements in logical row-major order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let storage = self.read_storage()?;
        Ok(self.layout.arena_indices().map(|i| storage[i]).collect())
    }

    /// All elements widened to f64, in logical row-major order.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        let storage = self.read_storage()?;
        Ok(self
            .layout
            .arena_indices()
            .map(|i| storage[i].to_f64())
            .collect())
    }

    /// An independent copy with its own contiguous arena.
    pub fn deep_clone(&self) -> Result<Self> {
        Ok(Self::from_parts(self.to_vec()?, *self.shape()))
    }

    /// Copy into a new array whose slices are (rows, columns): each slice is
    /// zero-padded at the bottom/right, or truncated, to fit.
    ///
    /// Kernels and channels are unchanged.
    pub fn pad_post(&self, rows: usize, columns: usize) -> Result<Self> {
        let src = *self.shape();
        let shape = src.with_matrix(rows, columns);
        let mut data = vec![T::zero(); shape.length()];
        let storage = self.read_storage()?;
        let keep_rows = rows.min(src.rows());
        let keep_columns = columns.min(src.columns());
        for (slice, &offset) in self.layout.offsets().iter().enumerate() {
            let base = slice * shape.matrix_length();
            for row in 0..keep_rows {
                let from = offset + src.matrix_index(row, 0);
                let to = base + shape.matrix_index(row, 0);
                data[to..to + keep_columns].copy_from_slice(&storage[from..from + keep_columns]);
            }
        }
        Ok(Self::from_parts(data, shape))
    }

    /// Copy a slice of another element kind into slice position `index`,
    /// converting each value through the coercion table.
    pub fn set_slice_coerced<S: WithDType>(
        &mut self,
        index: usize,
        slice: &DenseArray<S>,
    ) -> Result<&mut Self> {
        self.check_slice_target(index, slice.shape())?;
        let values: Vec<T> = slice
            .to_vec()?
            .into_iter()
            .map(T::coerce_from)
            .collect();
        let offset = self.layout.slice_offset(index)?;
        {
            let mut storage = self.write_storage()?;
            storage[offset..offset + values.len()].copy_from_slice(&values);
        }
        Ok(self)
    }

    fn check_slice_target(&self, index: usize, got: &Shape) -> Result<()> {
        let expected = self.shape().matrix_shape();
        if *got != expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: *got,
            });
        }
        if index >= self.shape().slice_length() {
            return Err(Error::SliceOutOfRange {
                index,
                slices: self.shape().slice_length(),
            });
        }
        Ok(())
    }
}

impl<T: WithDType> NdArray for DenseArray<T> {
    type Elem = T;

    fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    fn get(&self, kernel: usize, channel: usize, row: usize, column: usize) -> Result<T> {
        let i = self.layout.flat_index(kernel, channel, row, column)?;
        Ok(self.read_storage()?[i])
    }

    fn set(
        &mut self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
        value: T,
    ) -> Result<()> {
        let i = self.layout.flat_index(kernel, channel, row, column)?;
        self.write_storage()?[i] = value;
        Ok(())
    }

    fn is_dense(&self) -> bool {
        true
    }

    fn get_linear_f64(&self, index: usize) -> Result<f64> {
        let i = self.layout.linear_index(index)?;
        Ok(self.read_storage()?[i].to_f64())
    }

    /// Redistribute into a fresh arena laid out for `new_shape`.
    ///
    /// Element `i` in row-major order under the current shape lands at
    /// `(new_shape.to_slice_index(i), new_shape.to_matrix_index(i))`. The
    /// length check happens first; on error nothing changes.
    fn reshape(&mut self, new_shape: Shape) -> Result<&mut Self> {
        let target = self.shape().reshape(new_shape)?;
        let data = {
            let storage = self.read_storage()?;
            let m = target.matrix_length();
            let mut data = vec![T::zero(); target.length()];
            for (i, src) in self.layout.arena_indices().enumerate() {
                data[target.to_slice_index(i) * m + target.to_matrix_index(i)] = storage[src];
            }
            data
        };
        log::debug!("reshape {} -> {}", self.shape(), target);
        self.storage = Arc::new(RwLock::new(data));
        self.layout = Layout::contiguous(target);
        Ok(self)
    }

    fn slice(&self, index: usize) -> Result<Self> {
        Ok(self.view_with_layout(self.layout.select(index)?))
    }

    fn slice_range(
        &self,
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
    ) -> Result<Self> {
        let layout = self
            .layout
            .narrow(start_kernel, start_channel, end_kernel, end_channel)?;
        Ok(self.view_with_layout(layout))
    }

    /// Bulk-copy `slice` into slice position `index`.
    ///
    /// `slice` must have shape (rows, columns) of `self`. Copying from a view
    /// of `self` (same arena) is allowed.
    fn set_slice(&mut self, index: usize, slice: &Self) -> Result<&mut Self> {
        self.check_slice_target(index, slice.shape())?;
        let to = self.layout.slice_offset(index)?;
        let from = slice.layout.slice_offset(0)?;
        let len = self.shape().matrix_length();
        if self.shares_storage(slice) {
            let mut storage = self.write_storage()?;
            storage.copy_within(from..from + len, to);
        } else {
            let src = slice.read_storage()?;
            let mut dst = self.write_storage()?;
            dst[to..to + len].copy_from_slice(&src[from..from + len]);
        }
        Ok(self)
    }
}

// Helpers for the literal constructors

/// Length shared by every element of `items`; `JaggedLiteral` otherwise.
fn uniform_len<I, X>(items: &[I], level: usize) -> Result<usize>
where
    I: AsRef<[X]>,
{
    first_len(items.iter().map(|i| i.as_ref()), level)
}

/// Length of the first sub-array, checked against every following one.
/// An empty sequence has length 0.
fn first_len<'a, X: 'a>(
    mut items: impl Iterator<Item = &'a [X]>,
    level: usize,
) -> Result<usize> {
    let Some(first) = items.next() else {
        return Ok(0);
    };
    let expected = first.len();
    for item in items {
        if item.len() != expected {
            return Err(Error::JaggedLiteral {
                level,
                expected,
                got: item.len(),
            });
        }
    }
    Ok(expected)
}

impl<T: WithDType> fmt::Debug for DenseArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DenseArray(shape={}, dtype={}, contiguous={}, shared={})",
            self.shape(),
            T::DTYPE,
            self.is_contiguous(),
            self.is_shared(),
        )
    }
}

impl<T: WithDType> fmt::Display for DenseArray<T> {
    /// One block per slice, one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.to_vec().map_err(|_| fmt::Error)?;
        let shape = self.shape();
        writeln!(f, "DenseArray<{}> {}", T::DTYPE, shape)?;
        if shape.columns() == 0 {
            return Ok(());
        }
        for (i, row) in values.chunks(shape.columns()).enumerate() {
            if i > 0 && i % shape.rows() == 0 {
                writeln!(f)?;
            }
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "  [{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

impl<T: WithDType> PartialEq for DenseArray<T> {
    /// Same shape and same values, regardless of layout or aliasing.
    fn eq(&self, other: &Self) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        match (self.to_vec(), other.to_vec()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
