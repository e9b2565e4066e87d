use super::{
    error::FrameError,
    frame::Frame,
    frame_header::{FrameHeader, FRAME_HEADER_LEN},
};

/// Re-splits a byte stream into frames. Used by stream transports that do
/// not preserve frame boundaries on their own.
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_size,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drains everything buffered, complete or not
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Returns the raw bytes of the next complete frame, if one is buffered.
    /// The header is validated as soon as it is available.
    pub fn next_frame_bytes(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.buffer.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }
        let mut header_bytes = [0u8; FRAME_HEADER_LEN];
        header_bytes.copy_from_slice(&self.buffer[..FRAME_HEADER_LEN]);
        let header = FrameHeader::from_bytes(&header_bytes, self.max_frame_size)?;

        let size = header.size as usize;
        if self.buffer.len() < size {
            return Ok(None);
        }
        let rest = self.buffer.split_off(size);
        let frame = std::mem::replace(&mut self.buffer, rest);
        Ok(Some(frame))
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        match self.next_frame_bytes()? {
            Some(bytes) => Frame::decode(&bytes, self.max_frame_size).map(Some),
            None => Ok(None),
        }
    }
}
