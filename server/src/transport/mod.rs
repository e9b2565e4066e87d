cfg_if! {
    if #[cfg(feature = "transport_tcp")] {
        pub mod tcp;
    } else {}
}

pub use cellsync_shared::{FrameReceiver, FrameSender, RecvError, SendError};

/// A listening endpoint that hands over one framed stream per connecting client
pub trait Socket {
    fn listen(self: Box<Self>) -> Box<dyn SessionAcceptor>;
}

/// Yields the streams of newly connected clients
pub trait SessionAcceptor: Send {
    /// Returns the frame pipes of the next connected client, `Ok(None)` when
    /// no client is waiting
    fn accept(
        &mut self,
    ) -> Result<Option<(Box<dyn FrameSender>, Box<dyn FrameReceiver>)>, RecvError>;
}
