//! # Cellsync Serde
//! Byte-level serialization used by every cellsync wire structure. All
//! fixed-width integers are big-endian so that binary identifiers keep
//! their ordering on the wire.

mod byte_reader;
mod byte_writer;
mod error;
mod integer;
mod number;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::{ByteWrite, ByteWriter};
pub use error::SerdeErr;
pub use integer::{SignedVariableInteger, UnsignedVariableInteger};
pub use serde::Serde;
