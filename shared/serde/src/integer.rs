use crate::{ByteReader, ByteWrite, Serde, SerdeErr};

/// Unsigned integer written 7 bits at a time, low group first, with the high
/// bit of each byte flagging that another group follows.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedVariableInteger {
    inner: u64,
}

impl UnsignedVariableInteger {
    pub fn new(value: u64) -> Self {
        Self { inner: value }
    }

    pub fn get(&self) -> u64 {
        self.inner
    }
}

impl Serde for UnsignedVariableInteger {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let mut value = self.inner;
        loop {
            let group = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                writer.write_byte(group);
                return;
            }
            writer.write_byte(group | 0x80);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = reader.read_byte()?;
            let group = (byte & 0x7f) as u64;
            if shift == 63 && group > 1 {
                return Err(SerdeErr::VariableIntegerOverflow);
            }
            output |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(Self { inner: output });
            }
            shift += 7;
            if shift > 63 {
                return Err(SerdeErr::VariableIntegerOverflow);
            }
        }
    }
}

/// Signed counterpart of [`UnsignedVariableInteger`], zig-zag mapped so that
/// small negative numbers stay short.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SignedVariableInteger {
    inner: i64,
}

impl SignedVariableInteger {
    pub fn new(value: i64) -> Self {
        Self { inner: value }
    }

    pub fn get(&self) -> i64 {
        self.inner
    }
}

impl Serde for SignedVariableInteger {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let zigzag = ((self.inner << 1) ^ (self.inner >> 63)) as u64;
        UnsignedVariableInteger::new(zigzag).ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let zigzag = UnsignedVariableInteger::de(reader)?.get();
        let value = ((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64);
        Ok(Self { inner: value })
    }
}
