//! # tessera-core
//!
//! Dense, rank ≤ 4 numeric arrays addressed by (kernel, channel, row, column).
//!
//! This crate provides:
//! - [`Shape`]: the four-axis shape, its derived lengths and index formulas
//! - [`Layout`]: per-slice offsets into a shared storage arena
//! - [`NdArray`]: the array contract (typed and f64 access, reshape, slicing)
//! - [`DenseArray`]: dense storage for one element kind
//! - [`Array`]: a dense array whose element kind is a runtime [`DType`]
//! - [`Error`]: the single error type, with [`ErrorKind`] classification
//!
//! Slicing returns views over the same arena; `set_slice` copies. Reshape
//! validates first and never leaves a half-written array behind.

pub mod array;
pub mod dense;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod shape;
pub mod tagged;

pub use array::NdArray;
pub use dense::DenseArray;
pub use dtype::{DType, WithDType};
pub use error::{Error, ErrorKind, Result};
pub use layout::Layout;
pub use shape::Shape;
pub use tagged::{Array, DenseKind};
