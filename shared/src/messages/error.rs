use cellsync_serde::SerdeErr;
use thiserror::Error;

use super::ErrCode;

/// Errors that can occur while decoding a message batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgCodecError {
    /// Operation code not known to this protocol revision
    #[error("Unknown message operation code {code}. The peer speaks a different protocol revision")]
    UnknownOpcode { code: u8 },

    /// The body of an operation was not fully consumed by its decoder
    #[error("Message body for {op} has {remaining} trailing bytes")]
    TrailingBytes { op: &'static str, remaining: usize },

    /// The batch held bytes after its last message
    #[error("Batch has {remaining} bytes after its last message")]
    TrailingBatchBytes { remaining: usize },

    /// Underlying byte-level decoding failure
    #[error("Malformed message: {0}")]
    Serde(#[from] SerdeErr),
}

impl MsgCodecError {
    pub fn code(&self) -> ErrCode {
        match self {
            MsgCodecError::UnknownOpcode { .. } => ErrCode::ProtocolNotRecognized,
            _ => ErrCode::MalformedTx,
        }
    }
}
