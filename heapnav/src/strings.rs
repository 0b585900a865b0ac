use object::{BasicType, ClassDefinition};

use crate::NavigatorError;

/// `String.coder` of a compact (JDK 9+) string.
pub const CODER_LATIN1: u64 = 0;
pub const CODER_UTF16: u64 = 1;

/// Text of a string backing array.
///
/// `[B` arrays hold Latin-1 bytes or UTF-16 code units in the dumping
/// JVM's byte order (little-endian), selected by `coder`. `[C` arrays
/// (JDK 8 and older) hold UTF-16 code units in HPROF's big-endian order and
/// ignore the coder.
pub fn decode_backing_array(
    array_id: u64,
    array_class: &ClassDefinition,
    data: &[u8],
    coder: u64,
) -> Result<String, NavigatorError> {
    match array_class.primitive_array_element_type() {
        Some(BasicType::Byte) => match coder {
            CODER_LATIN1 => Ok(data.iter().map(|&b| b as char).collect()),
            CODER_UTF16 => Ok(decode_utf16(data, u16::from_le_bytes)),
            _ => Err(NavigatorError::UnsupportedStringCoder { coder }),
        },
        Some(BasicType::Char) => Ok(decode_utf16(data, u16::from_be_bytes)),
        _ => Err(NavigatorError::NotAString {
            id: array_id,
            class: array_class.name.clone(),
        }),
    }
}

fn decode_utf16(data: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_class() -> ClassDefinition {
        ClassDefinition::new("[B", 7, 1)
    }

    fn chars_class() -> ClassDefinition {
        ClassDefinition::new("[C", 8, 1)
    }

    fn utf16(text: &str, to_bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
        text.encode_utf16().flat_map(to_bytes).collect()
    }

    #[test]
    fn latin1_bytes() {
        let data = [b'c', b'a', b'f', 0xE9];
        assert_eq!(
            decode_backing_array(9, &bytes_class(), &data, CODER_LATIN1),
            Ok("café".to_string())
        );
    }

    #[test]
    fn utf16_bytes_are_little_endian() {
        let data = utf16("héλ😀", u16::to_le_bytes);
        assert_eq!(
            decode_backing_array(9, &bytes_class(), &data, CODER_UTF16),
            Ok("héλ😀".to_string())
        );
    }

    #[test]
    fn char_arrays_are_big_endian() {
        let data = utf16("chars", u16::to_be_bytes);
        assert_eq!(
            decode_backing_array(9, &chars_class(), &data, CODER_UTF16),
            Ok("chars".to_string())
        );
    }

    #[test]
    fn unknown_coder_is_rejected() {
        assert_eq!(
            decode_backing_array(9, &bytes_class(), b"x", 7),
            Err(NavigatorError::UnsupportedStringCoder { coder: 7 })
        );
    }

    #[test]
    fn other_arrays_cannot_back_strings() {
        let ints = ClassDefinition::new("[I", 10, 1);
        assert_eq!(
            decode_backing_array(9, &ints, &[0, 0, 0, 1], CODER_LATIN1),
            Err(NavigatorError::NotAString {
                id: 9,
                class: "[I".to_string()
            })
        );
    }

    #[test]
    fn dangling_utf16_byte_is_ignored() {
        let mut data = utf16("ok", u16::to_le_bytes);
        data.push(0x41);
        assert_eq!(
            decode_backing_array(9, &bytes_class(), &data, CODER_UTF16),
            Ok("ok".to_string())
        );
    }
}
