//! # tessera-interop
//!
//! Bridges tessera arrays and tensors owned by external runtimes.
//!
//! - [`ExternalTensor`]: the three-method capability an outside tensor
//!   must expose (element tag, dimensions, row-major copy-out)
//! - [`from_external`] / [`from_external_as`]: import into [`tessera_core::Array`]
//!   or a statically typed [`tessera_core::DenseArray`]
//! - [`HostTensor`] and [`to_external`]: export into a packed little-endian
//!   buffer, optionally changing kind or declared rank via [`ExportConfig`]

pub mod convert;
pub mod external;
pub mod host;

pub use convert::{from_external, from_external_as, to_external, ExportConfig};
pub use external::{ExternalTensor, TensorDataType};
pub use host::HostTensor;
