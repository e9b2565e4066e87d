use std::default::Default;

use cellsync_shared::ConnectionConfig;

/// How the host answers an invalid operation inside an open request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectPolicy {
    /// Refuse the operation with a `Reject` message and keep the request open
    Report,
    /// Close the request, attaching the error
    CloseRequest,
}

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Determines whether a Client must answer a login challenge before it
    /// may register definitions or pin cells.
    pub require_auth: bool,
    /// Used to configure the connections with Clients
    pub connection: ConnectionConfig,
    /// What to do when a Client sends an operation that cannot be applied
    pub reject_policy: RejectPolicy,
    /// Number of random bytes in a login challenge
    pub challenge_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            connection: ConnectionConfig::default(),
            reject_policy: RejectPolicy::Report,
            challenge_len: 32,
        }
    }
}
