use thiserror::Error;

use crate::messages::ErrCode;

/// Errors that can occur while minting or parsing identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Text form has the wrong number of characters
    #[error("Malformed id: expected {expected} characters, got {actual}")]
    MalformedLength { expected: usize, actual: usize },

    /// Text form contains a character outside the geohash base32 alphabet
    #[error("Malformed id: character {character:?} at position {position} is not in the base32 alphabet")]
    MalformedCharacter { character: char, position: usize },

    /// The unused low bits of the final text character were not zero
    #[error("Malformed id: trailing pad bits are not zero")]
    MalformedPadding,

    /// Binary form has the wrong number of bytes
    #[error("Malformed id: expected {expected} bytes, got {actual}")]
    MalformedBinary { expected: usize, actual: usize },

    /// Timestamp does not fit the 48-bit seconds prefix
    #[error("Timestamp of {secs} seconds does not fit the 48-bit TID prefix")]
    TimestampOutOfRange { secs: u64 },

    /// Hash suffix is longer than the fixed TID suffix
    #[error("Hash suffix of {len} bytes exceeds the {max}-byte TID suffix")]
    SuffixTooLong { len: usize, max: usize },

    /// The system clock reads before the UNIX epoch
    #[error("System clock is before the UNIX epoch")]
    ClockBeforeEpoch,
}

impl IdError {
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            IdError::MalformedLength { .. }
                | IdError::MalformedCharacter { .. }
                | IdError::MalformedPadding
                | IdError::MalformedBinary { .. }
        )
    }

    pub fn code(&self) -> ErrCode {
        if self.is_malformed() {
            ErrCode::BadValue
        } else {
            ErrCode::DataFailure
        }
    }
}
