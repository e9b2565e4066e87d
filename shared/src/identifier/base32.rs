use crate::identifier::IdError;

/// Geohash base32 alphabet. Its characters are in ascending ASCII order, so
/// fixed-length encodings compare the same way as the bytes they encode.
pub const GEOHASH_ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

const INVALID: u8 = 0xff;

const fn decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut index = 0;
    while index < 32 {
        table[GEOHASH_ALPHABET[index] as usize] = index as u8;
        index += 1;
    }
    table
}

static DECODE_TABLE: [u8; 256] = decode_table();

/// Number of characters needed to encode `byte_len` bytes
pub const fn encoded_len(byte_len: usize) -> usize {
    (byte_len * 8 + 4) / 5
}

/// Encodes bytes most-significant bit first, zero-padding the final group.
pub fn encode_base32(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(encoded_len(bytes.len()));
    let mut buffer: u16 = 0;
    let mut bits: u8 = 0;

    for byte in bytes {
        buffer = (buffer << 8) | (*byte as u16);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = (buffer >> bits) & 0x1f;
            output.push(GEOHASH_ALPHABET[index as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        let index = (buffer << (5 - bits)) & 0x1f;
        output.push(GEOHASH_ALPHABET[index as usize] as char);
    }

    output
}

/// Decodes text produced by [`encode_base32`] back into exactly `byte_len` bytes.
pub fn decode_base32(text: &str, byte_len: usize) -> Result<Vec<u8>, IdError> {
    let expected = encoded_len(byte_len);
    if text.len() != expected {
        return Err(IdError::MalformedLength {
            expected,
            actual: text.chars().count(),
        });
    }

    let mut output = Vec::with_capacity(byte_len);
    let mut buffer: u16 = 0;
    let mut bits: u8 = 0;

    for (position, character) in text.bytes().enumerate() {
        let value = DECODE_TABLE[character as usize];
        if value == INVALID {
            return Err(IdError::MalformedCharacter {
                character: character as char,
                position,
            });
        }
        buffer = (buffer << 5) | value as u16;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if output.len() < byte_len {
                output.push((buffer >> bits) as u8);
            }
            buffer &= (1 << bits) - 1;
        }
    }

    if buffer != 0 {
        return Err(IdError::MalformedPadding);
    }

    Ok(output)
}
