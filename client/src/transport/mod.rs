cfg_if! {
    if #[cfg(feature = "transport_tcp")] {
        pub mod tcp;
    } else {}
}

pub use cellsync_shared::{FrameReceiver, FrameSender, RecvError, SendError};

/// Connects to a host and hands back the two halves of the framed stream
pub trait Socket {
    fn connect(self: Box<Self>) -> (Box<dyn FrameSender>, Box<dyn FrameReceiver>);
}
