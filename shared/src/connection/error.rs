use thiserror::Error;

use crate::{
    messages::{ErrCode, MsgCodecError},
    transport::{RecvError, SendError},
};

/// Errors that can occur while reading or writing transport frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Reserved header bytes were not zero (SECURITY: possibly a different protocol)
    #[error("Frame header reserved bytes {reserved:?} must be zero. The peer does not speak this protocol")]
    ReservedNotZero { reserved: [u8; 3] },

    /// Declared frame size smaller than the header, or not matching the received bytes
    #[error("Frame declares size {size} but {actual} bytes are available. A frame is at least 8 bytes")]
    InvalidSize { size: u32, actual: usize },

    /// Declared frame size exceeds the configured limit
    #[error("Frame of {size} bytes exceeds the maximum frame size of {max} bytes")]
    FrameTooLarge { size: u64, max: usize },

    /// Unknown opcode in the frame header
    #[error("Unknown frame opcode {opcode}. Expected 1 (transaction) or 2 (end of stream)")]
    UnknownOpcode { opcode: u8 },

    /// End-of-stream frames carry no payload
    #[error("End of stream frame carries {len} payload bytes")]
    UnexpectedPayload { len: usize },

    /// The transaction payload could not be decoded
    #[error("Transaction payload is malformed: {0}")]
    Codec(#[from] MsgCodecError),
}

impl FrameError {
    pub fn code(&self) -> ErrCode {
        match self {
            FrameError::ReservedNotZero { .. } | FrameError::UnknownOpcode { .. } => {
                ErrCode::ProtocolNotRecognized
            }
            FrameError::Codec(inner) => inner.code(),
            _ => ErrCode::MalformedTx,
        }
    }
}

/// General connection-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Incoming frame could not be decoded
    #[error("Incoming frame rejected: {0}")]
    Frame(#[from] FrameError),

    /// Failed to hand a frame to the transport
    #[error("Transport send failed: {0}")]
    Send(#[from] SendError),

    /// Failed to read from the transport
    #[error("Transport receive failed: {0}")]
    Recv(#[from] RecvError),

    /// The connection already sent or received end of stream
    #[error("Connection is closed")]
    Closed,
}

impl ConnectionError {
    pub fn code(&self) -> ErrCode {
        match self {
            ConnectionError::Frame(inner) => inner.code(),
            ConnectionError::Send(_) | ConnectionError::Recv(_) | ConnectionError::Closed => {
                ErrCode::NotConnected
            }
        }
    }
}
