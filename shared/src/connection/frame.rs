use super::{
    error::FrameError,
    frame_header::{FrameHeader, FrameOp, FRAME_HEADER_LEN},
};
use crate::messages::{decode_batch, encode_batch, Msg, MsgBatch};

/// One unit moved across the transport
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Tx(MsgBatch),
    EndOfStream,
}

impl Frame {
    pub fn op(&self) -> FrameOp {
        match self {
            Frame::Tx(_) => FrameOp::Tx,
            Frame::EndOfStream => FrameOp::EndOfStream,
        }
    }

    pub fn encode(&self, max_frame_size: usize) -> Result<Vec<u8>, FrameError> {
        match self {
            Frame::Tx(msgs) => encode_tx(msgs, max_frame_size),
            Frame::EndOfStream => Ok(encode_end_of_stream().to_vec()),
        }
    }

    /// Decodes exactly one complete frame, header included
    pub fn decode(bytes: &[u8], max_frame_size: usize) -> Result<Frame, FrameError> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(FrameError::InvalidSize {
                size: bytes.len() as u32,
                actual: bytes.len(),
            });
        }
        let mut header_bytes = [0u8; FRAME_HEADER_LEN];
        header_bytes.copy_from_slice(&bytes[..FRAME_HEADER_LEN]);
        let header = FrameHeader::from_bytes(&header_bytes, max_frame_size)?;
        if header.size as usize != bytes.len() {
            return Err(FrameError::InvalidSize {
                size: header.size,
                actual: bytes.len(),
            });
        }

        let payload = &bytes[FRAME_HEADER_LEN..];
        match header.op {
            FrameOp::Tx => Ok(Frame::Tx(decode_batch(payload)?)),
            FrameOp::EndOfStream => {
                if !payload.is_empty() {
                    return Err(FrameError::UnexpectedPayload { len: payload.len() });
                }
                Ok(Frame::EndOfStream)
            }
        }
    }
}

pub fn encode_tx(msgs: &[Msg], max_frame_size: usize) -> Result<Vec<u8>, FrameError> {
    let payload = encode_batch(msgs);
    let header = FrameHeader::for_payload(FrameOp::Tx, payload.len(), max_frame_size)?;
    let mut bytes = Vec::with_capacity(header.size as usize);
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn encode_end_of_stream() -> [u8; FRAME_HEADER_LEN] {
    FrameHeader {
        size: FRAME_HEADER_LEN as u32,
        op: FrameOp::EndOfStream,
    }
    .to_bytes()
}
