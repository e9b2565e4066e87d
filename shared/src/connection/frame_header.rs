use super::error::FrameError;

pub const FRAME_HEADER_LEN: usize = 8;

/// Transport opcode carried in the last header byte
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum FrameOp {
    // A frame carrying a batch of messages
    Tx,
    // The sender will not send anything further on this stream
    EndOfStream,
}

impl FrameOp {
    pub fn to_byte(self) -> u8 {
        match self {
            FrameOp::Tx => 1,
            FrameOp::EndOfStream => 2,
        }
    }

    pub fn from_byte(opcode: u8) -> Result<Self, FrameError> {
        match opcode {
            1 => Ok(FrameOp::Tx),
            2 => Ok(FrameOp::EndOfStream),
            opcode => Err(FrameError::UnknownOpcode { opcode }),
        }
    }
}

/// `[reserved: 3][total size: u32 BE][opcode: 1]`, size includes the header
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub struct FrameHeader {
    pub size: u32,
    pub op: FrameOp,
}

impl FrameHeader {
    pub fn for_payload(op: FrameOp, payload_len: usize, max_frame_size: usize) -> Result<Self, FrameError> {
        let total = payload_len as u64 + FRAME_HEADER_LEN as u64;
        if total > max_frame_size as u64 || total > u32::MAX as u64 {
            return Err(FrameError::FrameTooLarge {
                size: total,
                max: max_frame_size,
            });
        }
        Ok(Self {
            size: total as u32,
            op,
        })
    }

    pub fn payload_len(&self) -> usize {
        self.size as usize - FRAME_HEADER_LEN
    }

    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut bytes = [0u8; FRAME_HEADER_LEN];
        bytes[3..7].copy_from_slice(&self.size.to_be_bytes());
        bytes[7] = self.op.to_byte();
        bytes
    }

    /// Parses and validates a header. Checks run in wire order: reserved
    /// bytes, size, then opcode.
    pub fn from_bytes(bytes: &[u8; FRAME_HEADER_LEN], max_frame_size: usize) -> Result<Self, FrameError> {
        let reserved = [bytes[0], bytes[1], bytes[2]];
        if reserved != [0, 0, 0] {
            return Err(FrameError::ReservedNotZero { reserved });
        }
        let size = u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]);
        if (size as usize) < FRAME_HEADER_LEN {
            return Err(FrameError::InvalidSize {
                size,
                actual: FRAME_HEADER_LEN,
            });
        }
        if size as usize > max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: size as u64,
                max: max_frame_size,
            });
        }
        let op = FrameOp::from_byte(bytes[7])?;
        Ok(Self { size, op })
    }
}
