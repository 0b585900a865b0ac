//! Unsigned LEB128: seven payload bits per byte, low groups first, the top
//! bit set on every byte except the last.

use crate::AuxError;

/// Longest encoding of a `u64`.
pub const MAX_U64_LEN: usize = 10;

/// Decode one value from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed. `base` is only used
/// to report error offsets relative to the enclosing buffer.
#[inline]
pub fn decode_u64(bytes: &[u8], base: usize) -> Result<(u64, usize), AuxError> {
    let mut result = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_U64_LEN {
            return Err(AuxError::Leb128Overflow { offset: base });
        }
        let payload = (byte & 0x7F) as u64;
        // the tenth byte may only contribute the top bit
        if shift == 63 && payload > 1 {
            return Err(AuxError::Leb128Overflow { offset: base });
        }
        result |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(AuxError::UnexpectedEof {
        offset: base + bytes.len(),
        needed: 1,
    })
}

/// Append the encoding of `value` to `out`.
#[inline]
pub fn encode_u64(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Number of bytes [`encode_u64`] writes for `value`.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings() {
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
            (i32::MAX as u64, &[0xFF, 0xFF, 0xFF, 0xFF, 0x07]),
        ];
        for (value, expected) in cases {
            let mut out = Vec::new();
            encode_u64(&mut out, value);
            assert_eq!(out, expected, "encoding of {value}");
            assert_eq!(encoded_len(value), expected.len());
            assert_eq!(decode_u64(&out, 0), Ok((value, expected.len())));
        }
    }

    #[test]
    fn u64_max_uses_ten_bytes() {
        let mut out = Vec::new();
        encode_u64(&mut out, u64::MAX);
        assert_eq!(out.len(), MAX_U64_LEN);
        assert_eq!(decode_u64(&out, 0), Ok((u64::MAX, MAX_U64_LEN)));
    }

    #[test]
    fn decoding_stops_at_first_terminal_byte() {
        let bytes = [0x96, 0x01, 0x05];
        assert_eq!(decode_u64(&bytes, 0), Ok((150, 2)));
        assert_eq!(decode_u64(&bytes[2..], 2), Ok((5, 1)));
    }

    #[test]
    fn truncated_value_is_eof() {
        let bytes = [0x80, 0x80];
        assert_eq!(
            decode_u64(&bytes, 4),
            Err(AuxError::UnexpectedEof {
                offset: 6,
                needed: 1
            })
        );
        assert!(decode_u64(&[], 0).is_err());
    }

    #[test]
    fn overlong_value_overflows() {
        let bytes = [0xFF; 11];
        assert_eq!(
            decode_u64(&bytes, 0),
            Err(AuxError::Leb128Overflow { offset: 0 })
        );

        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert_eq!(
            decode_u64(&too_big, 0),
            Err(AuxError::Leb128Overflow { offset: 0 })
        );
    }
}
