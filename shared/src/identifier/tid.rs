use std::{fmt, str::FromStr};

use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr};
use ring::digest;

use crate::{
    backends::Timestamp,
    identifier::{decode_base32, encode_base32, encoded_len, IdError},
};

pub const TID_LEN: usize = 32;
const TID_SECS_LEN: usize = 6;
const TID_TIME_LEN: usize = 8;
pub const TID_SUFFIX_LEN: usize = TID_LEN - TID_TIME_LEN;
pub const TID_TEXT_LEN: usize = encoded_len(TID_LEN);
pub const MAX_TID_SECS: u64 = (1 << 48) - 1;

/// Time-ordered transaction identifier.
///
/// Layout: `[UTC seconds, 6B BE][fraction of a second, 2B BE][hash suffix, 24B]`.
/// Byte-wise order equals chronological order of the embedded time, and the
/// base32 text form keeps that ordering under ASCII comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid([u8; TID_LEN]);

impl Tid {
    /// Builds a TID from a timestamp and a hash suffix. Suffixes shorter than
    /// the fixed width are zero-padded on the right.
    pub fn encode(timestamp: Timestamp, suffix: &[u8]) -> Result<Self, IdError> {
        if timestamp.secs > MAX_TID_SECS {
            return Err(IdError::TimestampOutOfRange {
                secs: timestamp.secs,
            });
        }
        if suffix.len() > TID_SUFFIX_LEN {
            return Err(IdError::SuffixTooLong {
                len: suffix.len(),
                max: TID_SUFFIX_LEN,
            });
        }

        let mut bytes = [0u8; TID_LEN];
        bytes[..TID_SECS_LEN].copy_from_slice(&timestamp.secs.to_be_bytes()[8 - TID_SECS_LEN..]);
        bytes[TID_SECS_LEN..TID_TIME_LEN].copy_from_slice(&timestamp.frac.to_be_bytes());
        bytes[TID_TIME_LEN..TID_TIME_LEN + suffix.len()].copy_from_slice(suffix);
        Ok(Self(bytes))
    }

    pub fn decode(&self) -> (Timestamp, [u8; TID_SUFFIX_LEN]) {
        let mut suffix = [0u8; TID_SUFFIX_LEN];
        suffix.copy_from_slice(&self.0[TID_TIME_LEN..]);
        (self.timestamp(), suffix)
    }

    pub fn timestamp(&self) -> Timestamp {
        let mut secs = [0u8; 8];
        secs[8 - TID_SECS_LEN..].copy_from_slice(&self.0[..TID_SECS_LEN]);
        let frac = u16::from_be_bytes([self.0[TID_SECS_LEN], self.0[TID_SECS_LEN + 1]]);
        Timestamp::new(u64::from_be_bytes(secs), frac)
    }

    pub fn suffix(&self) -> &[u8] {
        &self.0[TID_TIME_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8; TID_LEN] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        let array: [u8; TID_LEN] = bytes.try_into().map_err(|_| IdError::MalformedBinary {
            expected: TID_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    pub fn to_text(&self) -> String {
        encode_base32(&self.0)
    }

    pub fn from_text(text: &str) -> Result<Self, IdError> {
        let bytes = decode_base32(text, TID_LEN)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tid({})", self.to_text())
    }
}

impl FromStr for Tid {
    type Err = IdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_text(text)
    }
}

impl Serde for Tid {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_bytes(&self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(reader.read_array()?))
    }
}

/// Mints TIDs when a transaction is sealed. Consecutive TIDs from one minter
/// are strictly increasing even when the clock stalls or steps backwards.
pub struct TidMinter {
    last: Option<Timestamp>,
    sealed_count: u64,
}

impl TidMinter {
    pub fn new() -> Self {
        Self {
            last: None,
            sealed_count: 0,
        }
    }

    /// Seals `payload` at the current wall-clock time
    pub fn seal(&mut self, payload: &[u8]) -> Result<Tid, IdError> {
        let now = Timestamp::try_now().map_err(|_| IdError::ClockBeforeEpoch)?;
        self.seal_at(now, payload)
    }

    pub fn seal_at(&mut self, timestamp: Timestamp, payload: &[u8]) -> Result<Tid, IdError> {
        let timestamp = match self.last {
            Some(last) if timestamp <= last => next_tick(last),
            _ => timestamp,
        };

        let mut context = digest::Context::new(&digest::SHA256);
        context.update(&self.sealed_count.to_be_bytes());
        context.update(payload);
        let hash = context.finish();

        let tid = Tid::encode(timestamp, &hash.as_ref()[..TID_SUFFIX_LEN])?;
        self.last = Some(timestamp);
        self.sealed_count += 1;
        Ok(tid)
    }
}

impl Default for TidMinter {
    fn default() -> Self {
        Self::new()
    }
}

fn next_tick(timestamp: Timestamp) -> Timestamp {
    if timestamp.frac == u16::MAX {
        Timestamp::new(timestamp.secs + 1, 0)
    } else {
        Timestamp::new(timestamp.secs, timestamp.frac + 1)
    }
}
