use log::warn;

use super::{connection_config::ConnectionConfig, error::FrameError, frame::encode_tx};
use crate::messages::Msg;

/// Packs queued messages into as few transaction frames as the configured
/// batch length and frame size allow, preserving order.
pub struct FrameEncoder {
    max_frame_size: usize,
    max_batch_len: usize,
}

impl FrameEncoder {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            max_frame_size: config.max_frame_size,
            max_batch_len: config.max_batch_len.max(1),
        }
    }

    /// Encodes `msgs` into frames. A single message that cannot fit in any
    /// frame fails the whole call.
    pub fn encode(&self, msgs: &[Msg]) -> Result<Vec<Vec<u8>>, FrameError> {
        let mut frames = Vec::new();
        let mut start = 0;
        while start < msgs.len() {
            let mut end = (start + self.max_batch_len).min(msgs.len());
            loop {
                match encode_tx(&msgs[start..end], self.max_frame_size) {
                    Ok(frame) => {
                        frames.push(frame);
                        break;
                    }
                    Err(FrameError::FrameTooLarge { .. }) if end - start > 1 => {
                        end = start + (end - start) / 2;
                    }
                    Err(err) => {
                        warn!(
                            "message {} for request {} cannot be framed: {}",
                            msgs[start].op.name(),
                            msgs[start].req_id,
                            err
                        );
                        return Err(err);
                    }
                }
            }
            start = end;
        }
        Ok(frames)
    }
}
