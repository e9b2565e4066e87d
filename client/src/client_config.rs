use std::{default::Default, time::Duration};

use cellsync_shared::ConnectionConfig;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Frame limits of the connection
    pub connection: ConnectionConfig,
    /// Backoff applied to pins the host closed with a transient error
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff for transient failures (`Timeout`, `ShuttingDown`,
/// `NotConnected`, `SessionExpired`)
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Retries allowed per pin; 0 disables retrying
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), or `None` once the
    /// budget is spent
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi(attempt as i32);
        let nanos = self.initial_backoff.as_nanos() as f64 * factor;
        let capped = nanos.min(self.max_backoff.as_nanos() as f64);
        Some(Duration::from_nanos(capped as u64))
    }
}
