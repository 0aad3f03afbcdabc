use std::fmt;

// DType: The closed set of element kinds
//
// Every dense array stores exactly one element kind. The kinds are:
//
//   F16   16-bit IEEE half float
//   BF16  16-bit brain float
//   F32   32-bit float
//   F64   64-bit float
//   U8    unsigned byte (images, masks)
//   I32   signed 32-bit int (token ids, labels)
//   I64   signed 64-bit int
//
// Cross-kind arithmetic and copies go through f64: every kind widens to f64
// (`to_f64`) and narrows back with a fixed per-kind rule (`from_f64`). That
// pair is the coercion table. There is no other conversion path, so the rule
// applied to a value never depends on where it came from.

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    U8,
    I32,
    I64,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 => 2,
            DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
            DType::U8 => 1,
            DType::I32 => 4,
            DType::I64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::I32 => "i32",
            DType::I64 => "i64",
        };
        write!(f, "{}", s)
    }
}

/// Trait implemented by Rust types that can be stored in a dense array.
///
/// Provides the mapping between the concrete Rust type and the [`DType`]
/// tag, plus the widening (`to_f64`) and narrowing (`from_f64`) halves of
/// the coercion table.
///
/// Narrowing rules:
/// - float kinds round to the nearest representable value
/// - integer kinds truncate toward zero, saturate at the type bounds, and
///   map NaN to zero
pub trait WithDType:
    Copy + Send + Sync + 'static + num_traits::NumCast + PartialEq + fmt::Debug + fmt::Display
{
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Widen to f64.
    fn to_f64(self) -> f64;

    /// Narrow from f64 using the kind's coercion rule.
    fn from_f64(v: f64) -> Self;

    /// The zero value, used to fill new arrays and padding.
    fn zero() -> Self {
        Self::from_f64(0.0)
    }

    /// Convert a value of any kind into this one. A value already of this
    /// kind passes through unchanged; any other kind goes through the table.
    fn coerce_from<S: WithDType>(v: S) -> Self {
        if S::DTYPE == Self::DTYPE {
            if let Some(same) = num_traits::cast::<S, Self>(v) {
                return same;
            }
        }
        Self::from_f64(v.to_f64())
    }
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl WithDType for half::f16 {
    const DTYPE: DType = DType::F16;
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }
}

impl WithDType for half::bf16 {
    const DTYPE: DType = DType::BF16;
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }
}

// `as` from a float truncates toward zero, saturates and sends NaN to 0,
// which is exactly the integer row of the table.

impl WithDType for u8 {
    const DTYPE: DType = DType::U8;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as u8
    }
}

impl WithDType for i32 {
    const DTYPE: DType = DType::I32;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as i32
    }
}

impl WithDType for i64 {
    const DTYPE: DType = DType::I64;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as i64
    }
}
