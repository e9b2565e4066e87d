use std::{fmt, str::FromStr};

use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use crate::identifier::{decode_base32, encode_base32, encoded_len, IdError};

pub const CELL_ID_LEN: usize = 16;
pub const CELL_ID_TEXT_LEN: usize = encoded_len(CELL_ID_LEN);

/// 128-bit cell identifier made of two 64-bit halves. A zero second half
/// marks an ephemeral (non-persistent) cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CellId {
    pub hi: u64,
    pub lo: u64,
}

impl CellId {
    pub const NIL: CellId = CellId { hi: 0, lo: 0 };

    pub const fn new(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    pub const fn ephemeral(hi: u64) -> Self {
        Self { hi, lo: 0 }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.lo == 0
    }

    pub fn is_nil(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    pub fn to_bytes(&self) -> [u8; CELL_ID_LEN] {
        let mut bytes = [0u8; CELL_ID_LEN];
        bytes[..8].copy_from_slice(&self.hi.to_be_bytes());
        bytes[8..].copy_from_slice(&self.lo.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        if bytes.len() != CELL_ID_LEN {
            return Err(IdError::MalformedBinary {
                expected: CELL_ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&bytes[..8]);
        lo.copy_from_slice(&bytes[8..]);
        Ok(Self::new(u64::from_be_bytes(hi), u64::from_be_bytes(lo)))
    }

    pub fn to_text(&self) -> String {
        encode_base32(&self.to_bytes())
    }

    pub fn from_text(text: &str) -> Result<Self, IdError> {
        let bytes = decode_base32(text, CELL_ID_LEN)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({:#x}, {:#x})", self.hi, self.lo)
    }
}

impl FromStr for CellId {
    type Err = IdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_text(text)
    }
}

impl Serde for CellId {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_bytes(&self.to_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let bytes: [u8; CELL_ID_LEN] = reader.read_array()?;
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&bytes[..8]);
        lo.copy_from_slice(&bytes[8..]);
        Ok(Self::new(u64::from_be_bytes(hi), u64::from_be_bytes(lo)))
    }
}
