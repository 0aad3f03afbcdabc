use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

// Shape: Four-axis shape representation
//
// Every array is addressed by four logical axes, outermost first:
//
//   kernel, channel, row, column
//
// A lower-rank shape fills the *leading* axes with 1:
//   - Vector: Shape::from(5)          → (1, 1, 1, 5)   rank 1
//   - Matrix: Shape::from((3, 4))     → (1, 1, 3, 4)   rank 2
//   - Volume: Shape::from((2, 3, 4))  → (1, 2, 3, 4)   rank 3
//   - Full:   Shape::from((2,3,4,5))  → (2, 3, 4, 5)   rank 4
//
// Storage is split in two levels. The (kernel, channel) pair picks a *slice*
// and the (row, column) pair picks an element inside that slice's row-major
// matrix:
//
//   slice_index(k, c)    = k * channels + c
//   matrix_index(r, col) = r * columns + col
//
// A linear index i over the whole array (row-major over all four axes)
// decomposes the same way, with matrix_length() = rows * columns:
//
//   slice  = i / matrix_length()
//   matrix = i % matrix_length()
//
// Shape is an immutable Copy value. Reshaping an array binds a *new* Shape
// to it; nobody else holding the old one sees a change.

/// Four-axis shape of an array plus its declared rank.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    kernels: usize,
    channels: usize,
    rows: usize,
    columns: usize,
    rank: usize,
}

impl Shape {
    /// Create a rank-4 shape from all four axes.
    pub fn new(kernels: usize, channels: usize, rows: usize, columns: usize) -> Self {
        Shape {
            kernels,
            channels,
            rows,
            columns,
            rank: 4,
        }
    }

    /// Create a shape from a dimension sequence of length 0 to 4.
    ///
    /// The dims are right-aligned onto (kernel, channel, row, column). An
    /// empty sequence (a scalar) becomes a single-element rank-1 shape.
    /// Dims whose product overflows `usize` are rejected.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        let shape = match *dims {
            [] => Shape::from(1),
            [c] => Shape::from(c),
            [r, c] => Shape::from((r, c)),
            [ch, r, c] => Shape::from((ch, r, c)),
            [k, ch, r, c] => Shape::new(k, ch, r, c),
            _ => return Err(Error::RankOutOfRange { rank: dims.len() }),
        };
        Self::element_count(dims)?;
        Ok(shape)
    }

    /// Product of `dims` (1 for an empty list), or
    /// [`Error::DimensionOverflow`] if it does not fit in `usize`.
    pub fn element_count(dims: &[usize]) -> Result<usize> {
        dims.iter()
            .try_fold(1usize, |n, &d| n.checked_mul(d))
            .ok_or_else(|| Error::DimensionOverflow {
                dims: dims.to_vec(),
            })
    }

    /// The declared dimension sizes, outermost first (length = rank).
    pub fn dims(&self) -> Vec<usize> {
        let all = [self.kernels, self.channels, self.rows, self.columns];
        all[4 - self.rank..].to_vec()
    }

    /// Number of declared dimensions, 1 to 4.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn kernels(&self) -> usize {
        self.kernels
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of elements.
    pub fn length(&self) -> usize {
        self.kernels * self.channels * self.rows * self.columns
    }

    /// Number of (kernel, channel) slices.
    pub fn slice_length(&self) -> usize {
        self.kernels * self.channels
    }

    /// Number of elements in one slice.
    pub fn matrix_length(&self) -> usize {
        self.rows * self.columns
    }

    pub fn slice_index(&self, kernel: usize, channel: usize) -> usize {
        kernel * self.channels + channel
    }

    pub fn matrix_index(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Slice holding the element at global row-major position `index`.
    pub fn to_slice_index(&self, index: usize) -> usize {
        index.checked_div(self.matrix_length()).unwrap_or(0)
    }

    /// Position inside its slice of the element at global position `index`.
    pub fn to_matrix_index(&self, index: usize) -> usize {
        index.checked_rem(self.matrix_length()).unwrap_or(0)
    }

    /// The rank-2 (rows, columns) shape of a single slice.
    pub fn matrix_shape(&self) -> Shape {
        Shape::from((self.rows, self.columns))
    }

    /// Same kernels and channels, new matrix dimensions. The declared rank is
    /// kept, except that a rank-1 shape gaining rows becomes rank 2.
    pub fn with_matrix(&self, rows: usize, columns: usize) -> Shape {
        let rank = if self.rank == 1 && rows != 1 { 2 } else { self.rank };
        Shape {
            kernels: self.kernels,
            channels: self.channels,
            rows,
            columns,
            rank,
        }
    }

    /// Validate a reshape target and return it.
    ///
    /// Fails with [`Error::ReshapeElementMismatch`] when the element counts
    /// differ. `self` is never modified.
    pub fn reshape(&self, new_shape: Shape) -> Result<Shape> {
        if self.length() != new_shape.length() {
            return Err(Error::ReshapeElementMismatch {
                src: self.length(),
                dst: new_shape.length(),
                dst_shape: new_shape,
            });
        }
        Ok(new_shape)
    }

    /// Shape of the kernel/channel sub-range `[start, end)` at full (rows,
    /// columns). Both ranges must be non-empty and inside this shape.
    pub fn slice_shape(
        &self,
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
    ) -> Result<Shape> {
        if start_kernel >= end_kernel
            || start_channel >= end_channel
            || end_kernel > self.kernels
            || end_channel > self.channels
        {
            return Err(Error::InvalidSliceRange {
                start_kernel,
                start_channel,
                end_kernel,
                end_channel,
                shape: *self,
            });
        }
        Ok(Shape {
            kernels: end_kernel - start_kernel,
            channels: end_channel - start_channel,
            rows: self.rows,
            columns: self.columns,
            rank: self.rank,
        })
    }

    /// Check that a coordinate lies inside this shape.
    pub fn check_coord(
        &self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
    ) -> Result<()> {
        if kernel >= self.kernels
            || channel >= self.channels
            || row >= self.rows
            || column >= self.columns
        {
            return Err(Error::IndexOutOfBounds {
                coord: [kernel, channel, row, column],
                shape: *self,
            });
        }
        Ok(())
    }

    fn axes(&self) -> [usize; 4] {
        [self.kernels, self.channels, self.rows, self.columns]
    }
}

// Equality is dimension-wise: a rank-1 (1,1,1,5) and a rank-2 (1,5) shape
// describe the same storage and compare equal.

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.axes() == other.axes()
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.axes().hash(state);
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Convenient From implementations
// These let you write: Shape::from((3, 4)) instead of Shape::from_dims(&[3, 4])

impl From<usize> for Shape {
    /// 1-D shape (columns only).
    fn from(columns: usize) -> Self {
        Shape {
            kernels: 1,
            channels: 1,
            rows: 1,
            columns,
            rank: 1,
        }
    }
}

impl From<(usize,)> for Shape {
    fn from((columns,): (usize,)) -> Self {
        Shape::from(columns)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, columns): (usize, usize)) -> Self {
        Shape {
            kernels: 1,
            channels: 1,
            rows,
            columns,
            rank: 2,
        }
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((channels, rows, columns): (usize, usize, usize)) -> Self {
        Shape {
            kernels: 1,
            channels,
            rows,
            columns,
            rank: 3,
        }
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((kernels, channels, rows, columns): (usize, usize, usize, usize)) -> Self {
        Shape::new(kernels, channels, rows, columns)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = Error;

    fn try_from(dims: &[usize]) -> Result<Self> {
        Shape::from_dims(dims)
    }
}
