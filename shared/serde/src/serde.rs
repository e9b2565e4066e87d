use crate::{ByteReader, ByteWrite, SerdeErr, UnsignedVariableInteger};

/// A structure that can be written to and read back from the wire
pub trait Serde: Sized {
    /// Writes self into the given writer
    fn ser(&self, writer: &mut dyn ByteWrite);

    /// Parses an instance of Self from the given reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(SerdeErr::InvalidTag {
                kind: "bool",
                tag: tag as u64,
            }),
        }
    }
}

// Length-prefixed containers

pub(crate) fn read_length(reader: &mut ByteReader) -> Result<usize, SerdeErr> {
    let length = UnsignedVariableInteger::de(reader)?.get();
    if length > reader.remaining() as u64 {
        return Err(SerdeErr::LengthOutOfBounds {
            length,
            remaining: reader.remaining(),
        });
    }
    Ok(length as usize)
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::new(self.len() as u64).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader)?;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidUtf8)
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::new(self.len() as u64).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        // every element occupies at least one byte, so the remaining length bounds the count
        let length = read_length(reader)?;
        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => false.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}
