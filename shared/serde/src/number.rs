use crate::{ByteReader, ByteWrite, Serde, SerdeErr};

// Fixed-width numbers are written big-endian.

macro_rules! impl_fixed_width {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn ByteWrite) {
                    writer.write_bytes(&self.to_be_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    Ok(<$ty>::from_be_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, i16, i32, i64, f64);
