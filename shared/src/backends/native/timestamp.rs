use std::time::SystemTime;

use thiserror::Error;

/// Error type for timestamp operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// System time is before UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

/// Wall-clock time split the way TIDs and time series indexes store it:
/// whole UTC seconds plus a 16-bit binary fraction of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub secs: u64,
    pub frac: u16,
}

impl Timestamp {
    pub fn new(secs: u64, frac: u16) -> Self {
        Self { secs, frac }
    }

    /// Returns the current time.
    ///
    /// # Errors
    /// Returns `TimeError::SystemTimeBeforeEpoch` if system time is before UNIX epoch.
    pub fn try_now() -> Result<Self, TimeError> {
        Self::try_from_system_time(SystemTime::now())
    }

    pub fn try_from_system_time(time: SystemTime) -> Result<Self, TimeError> {
        let duration = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| TimeError::SystemTimeBeforeEpoch)?;
        let frac = ((duration.subsec_nanos() as u64) << 16) / 1_000_000_000;
        Ok(Self {
            secs: duration.as_secs(),
            frac: frac as u16,
        })
    }
}
