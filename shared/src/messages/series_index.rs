use std::fmt;

use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use crate::backends::Timestamp;

/// Key distinguishing multiple values of the same attribute. For time series
/// the value is 48.16 fixed point: whole UTC seconds shifted left 16 bits
/// plus a binary fraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesIndex(pub i64);

impl SeriesIndex {
    pub const ZERO: SeriesIndex = SeriesIndex(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Returns `None` when `secs` does not fit in 47 bits
    pub fn from_time(secs: u64, frac: u16) -> Option<Self> {
        if secs >= 1 << 47 {
            return None;
        }
        Some(Self(((secs as i64) << 16) | frac as i64))
    }

    pub fn from_timestamp(timestamp: Timestamp) -> Option<Self> {
        Self::from_time(timestamp.secs, timestamp.frac)
    }

    /// Splits the index into `(secs, frac)`, `None` for negative indexes
    pub fn as_time(&self) -> Option<(u64, u16)> {
        if self.0 < 0 {
            return None;
        }
        Some(((self.0 >> 16) as u64, (self.0 & 0xffff) as u16))
    }
}

impl From<i64> for SeriesIndex {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SeriesIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serde for SeriesIndex {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(i64::de(reader)?))
    }
}
