mod error;

pub use error::{RecvError, SendError};

/// Sending half of an ordered, reliable, framed stream
pub trait FrameSender: Send {
    /// Hands one complete frame to the transport
    fn send(&self, frame: &[u8]) -> Result<(), SendError>;
}

/// Receiving half of an ordered, reliable, framed stream
pub trait FrameReceiver: Send {
    /// Returns the next complete frame, `Ok(None)` when nothing is ready
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError>;
}
