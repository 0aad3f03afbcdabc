use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout: Where each slice of an array lives inside its arena
//
// A dense array owns (or shares) one contiguous arena `Vec<T>`. The Layout
// maps the array's logical slices onto that arena:
//
//   element (k, c, r, col) → offsets[slice_index(k, c)] + matrix_index(r, col)
//
// Each slice occupies matrix_length() consecutive arena elements starting at
// its offset. This is what makes slicing free:
//
// 1. **Fresh arrays** are contiguous: offsets are 0, m, 2m, ... where
//    m = matrix_length(). The arena holds exactly the array's elements in
//    row-major order.
//
// 2. **select(i)** keeps only offsets[i] under the (rows, columns) shape.
//    Same arena, one slice. Writes through it land in the source.
//
// 3. **narrow(sk, sc, ek, ec)** keeps the offsets of every (k, c) pair in
//    range, renumbered from (0, 0). Same arena again.
//
// Views never own a private copy; copying is always an explicit operation on
// the array (set_slice, deep_clone, reshape).

/// Shape plus the arena offset of every slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    /// Arena offset of each slice, indexed by `shape.slice_index(k, c)`.
    offsets: Vec<usize>,
}

impl Layout {
    /// Row-major layout where slice `i` starts at `i * matrix_length()`.
    pub fn contiguous(shape: Shape) -> Self {
        let m = shape.matrix_length();
        Layout {
            shape,
            offsets: (0..shape.slice_length()).map(|s| s * m).collect(),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Whether the arena holds exactly this array, in order, from offset 0.
    pub fn is_contiguous(&self) -> bool {
        let m = self.shape.matrix_length();
        self.offsets.iter().enumerate().all(|(i, &o)| o == i * m)
    }

    /// Arena offset of slice `index`.
    pub fn slice_offset(&self, index: usize) -> Result<usize> {
        self.offsets
            .get(index)
            .copied()
            .ok_or(Error::SliceOutOfRange {
                index,
                slices: self.offsets.len(),
            })
    }

    /// Arena position of a (kernel, channel, row, column) coordinate.
    pub fn flat_index(
        &self,
        kernel: usize,
        channel: usize,
        row: usize,
        column: usize,
    ) -> Result<usize> {
        self.shape.check_coord(kernel, channel, row, column)?;
        let slice = self.shape.slice_index(kernel, channel);
        Ok(self.offsets[slice] + self.shape.matrix_index(row, column))
    }

    /// Arena position of the element at global row-major position `index`.
    pub fn linear_index(&self, index: usize) -> Result<usize> {
        if index >= self.shape.length() {
            crate::bail!(
                "linear index {} out of bounds for shape {} ({} elements)",
                index,
                self.shape,
                self.shape.length()
            );
        }
        let slice = self.shape.to_slice_index(index);
        Ok(self.offsets[slice] + self.shape.to_matrix_index(index))
    }

    /// Single-slice view over (rows, columns).
    pub fn select(&self, index: usize) -> Result<Layout> {
        let offset = self.slice_offset(index)?;
        Ok(Layout {
            shape: self.shape.matrix_shape(),
            offsets: vec![offset],
        })
    }

    /// View over the kernel/channel sub-range `[start, end)`.
    pub fn narrow(
        &self,
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
    ) -> Result<Layout> {
        let shape = self
            .shape
            .slice_shape(start_kernel, start_channel, end_kernel, end_channel)?;
        let mut offsets = vec![0; shape.slice_length()];
        for kernel in start_kernel..end_kernel {
            for channel in start_channel..end_channel {
                let src = self.shape.slice_index(kernel, channel);
                let dst = shape.slice_index(kernel - start_kernel, channel - start_channel);
                offsets[dst] = self.offsets[src];
            }
        }
        Ok(Layout { shape, offsets })
    }

    /// Iterator over arena positions of every element, in logical order.
    pub fn arena_indices(&self) -> ArenaIter<'_> {
        ArenaIter::new(self)
    }
}

// ArenaIter: Walks a layout's elements in logical (row-major) order
//
// For a contiguous layout this just counts 0, 1, 2, ... For a view it hops
// from slice offset to slice offset, yielding matrix_length() consecutive
// positions from each.

/// Iterator that yields arena positions for each element of a Layout.
pub struct ArenaIter<'a> {
    offsets: std::slice::Iter<'a, usize>,
    matrix_length: usize,
    /// Remaining positions of the slice currently being walked.
    current: std::ops::Range<usize>,
    remaining: usize,
}

impl<'a> ArenaIter<'a> {
    fn new(layout: &'a Layout) -> Self {
        ArenaIter {
            offsets: layout.offsets.iter(),
            matrix_length: layout.shape.matrix_length(),
            current: 0..0,
            remaining: layout.shape.length(),
        }
    }
}

impl Iterator for ArenaIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(i) = self.current.next() {
                self.remaining -= 1;
                return Some(i);
            }
            let &offset = self.offsets.next()?;
            self.current = offset..offset + self.matrix_length;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ArenaIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(Shape::from((2, 3, 2, 2)));
        assert!(layout.is_contiguous());
        assert_eq!(layout.offsets(), &[0, 4, 8, 12, 16, 20]);
    }

    #[test]
    fn test_contiguous_indices() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let indices: Vec<usize> = layout.arena_indices().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_flat_index() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4, 5)));
        // slice (1, 2) = 5 → offset 100, matrix (3, 4) = 19
        assert_eq!(layout.flat_index(1, 2, 3, 4).unwrap(), 119);
        assert_eq!(layout.flat_index(0, 0, 0, 0).unwrap(), 0);
        assert!(layout.flat_index(2, 0, 0, 0).is_err());
    }

    #[test]
    fn test_select() {
        let layout = Layout::contiguous(Shape::from((3, 2, 2)));
        let view = layout.select(2).unwrap();
        assert_eq!(view.shape(), &Shape::from((2, 2)));
        assert_eq!(view.offsets(), &[8]);
        assert!(!view.is_contiguous());
        let indices: Vec<usize> = view.arena_indices().collect();
        assert_eq!(indices, vec![8, 9, 10, 11]);
        assert!(layout.select(3).is_err());
    }

    #[test]
    fn test_narrow() {
        // 3 kernels x 2 channels of 1x2 matrices.
        let layout = Layout::contiguous(Shape::from((3, 2, 1, 2)));
        let view = layout.narrow(1, 1, 3, 2).unwrap();
        assert_eq!(view.shape(), &Shape::from((2, 1, 1, 2)));
        // (1,1) → slice 3 → offset 6, (2,1) → slice 5 → offset 10
        assert_eq!(view.offsets(), &[6, 10]);
        let indices: Vec<usize> = view.arena_indices().collect();
        assert_eq!(indices, vec![6, 7, 10, 11]);
    }

    #[test]
    fn test_linear_index_on_view() {
        let layout = Layout::contiguous(Shape::from((4, 1, 3)));
        let view = layout.narrow(0, 2, 1, 4).unwrap();
        assert_eq!(view.linear_index(0).unwrap(), 6);
        assert_eq!(view.linear_index(5).unwrap(), 11);
        assert!(view.linear_index(6).is_err());
    }
}
