use crate::dtype::DType;
use crate::shape::Shape;

/// All errors that can occur within tessera.
///
/// Every failure is a contract violation detected before any mutation takes
/// place: a call that returns `Err` leaves the array it was called on exactly
/// as it was. [`Error::kind`] groups the variants into the three broad
/// categories callers usually branch on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two shapes that must agree do not (e.g. `set_slice` with a slice whose
    /// matrix shape differs from the target's).
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Cannot reshape because element counts differ.
    #[error(
        "cannot reshape: source has {src} elements, target shape {dst_shape} has {dst} elements"
    )]
    ReshapeElementMismatch {
        src: usize,
        dst: usize,
        dst_shape: Shape,
    },

    /// An external element type with no dense counterpart.
    #[error("unsupported element type '{0}'")]
    UnsupportedElementType(String),

    /// A statically typed request met an array of a different kind.
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },

    /// A (kernel, channel, row, column) coordinate outside the shape.
    #[error("index {coord:?} out of bounds for shape {shape}")]
    IndexOutOfBounds { coord: [usize; 4], shape: Shape },

    /// A slice index past `slice_length()`.
    #[error("slice index {index} out of range for {slices} slices")]
    SliceOutOfRange { index: usize, slices: usize },

    /// A kernel/channel sub-range that is empty, reversed or too long.
    #[error(
        "invalid slice range kernels {start_kernel}..{end_kernel}, channels {start_channel}..{end_channel} for shape {shape}"
    )]
    InvalidSliceRange {
        start_kernel: usize,
        start_channel: usize,
        end_kernel: usize,
        end_channel: usize,
        shape: Shape,
    },

    /// Nested literal whose sibling sub-arrays differ in length.
    #[error("jagged literal at nesting level {level}: expected length {expected}, got {got}")]
    JaggedLiteral {
        level: usize,
        expected: usize,
        got: usize,
    },

    /// More than four dimensions requested.
    #[error("rank {rank} is not supported (at most 4 dimensions)")]
    RankOutOfRange { rank: usize },

    /// Element count mismatch when creating from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Dimension sizes whose product does not fit in `usize`.
    #[error("dimensions {dims:?} overflow the addressable element count")]
    DimensionOverflow { dims: Vec<usize> },

    /// A thread panicked while holding an array's storage lock.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ShapeMismatch,
    UnsupportedElementType,
    InvalidArgument,
    /// Not caused by the arguments of the failing call (a poisoned lock).
    Internal,
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// `Msg` is reserved for argument errors without a dedicated variant
    /// and classifies as [`ErrorKind::InvalidArgument`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ShapeMismatch { .. } | Error::ReshapeElementMismatch { .. } => {
                ErrorKind::ShapeMismatch
            }
            Error::UnsupportedElementType(_) | Error::DTypeMismatch { .. } => {
                ErrorKind::UnsupportedElementType
            }
            Error::IndexOutOfBounds { .. }
            | Error::SliceOutOfRange { .. }
            | Error::InvalidSliceRange { .. }
            | Error::JaggedLiteral { .. }
            | Error::RankOutOfRange { .. }
            | Error::ElementCountMismatch { .. }
            | Error::DimensionOverflow { .. }
            | Error::Msg(_) => ErrorKind::InvalidArgument,
            Error::LockPoisoned => ErrorKind::Internal,
        }
    }
}

/// Convenience Result type used throughout tessera.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
