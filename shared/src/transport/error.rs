use thiserror::Error;

/// The transport refused or could not deliver a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transport closed while sending a frame")]
pub struct SendError;

/// The transport failed while polling for frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transport closed while receiving frames")]
pub struct RecvError;
