//! Conversions between byte-runs and `0x`-prefixed hexadecimal strings
//!
//! This is the textual form of bytes and big integers in the map representation.

use crate::error::HexConvError;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Formats `bytes` as a lowercase hexadecimal string with a leading `0x`.
///
/// ```
/// # use serix::hexstring::hex_of_bytes;
/// assert_eq!(hex_of_bytes(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
/// assert_eq!(hex_of_bytes(&[]), "0x");
/// ```
#[must_use]
pub fn hex_of_bytes(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(2 + bytes.len() * 2);
    hex.push_str("0x");
    for &byte in bytes {
        hex.push(char::from(DIGITS[usize::from(byte >> 4)]));
        hex.push(char::from(DIGITS[usize::from(byte & 0x0f)]));
    }
    hex
}

/// Strips an optional `0x`/`0X` prefix.
pub(crate) fn strip_prefix(src: &str) -> &str {
    src.strip_prefix("0x")
        .or_else(|| src.strip_prefix("0X"))
        .unwrap_or(src)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parses a hexadecimal string, with or without a leading `0x`, into bytes.
///
/// # Errors
///
/// Returns [`HexConvError::OddParity`] if the digits do not pair up, and
/// [`HexConvError::NonHex`] if any character is not a hexadecimal digit.
///
/// ```
/// # use serix::hexstring::bytes_of_hex;
/// assert_eq!(bytes_of_hex("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
/// assert_eq!(bytes_of_hex("CAFE").unwrap(), vec![0xca, 0xfe]);
/// ```
pub fn bytes_of_hex(src: &str) -> Result<Vec<u8>, HexConvError> {
    let digits = strip_prefix(src).as_bytes();
    if digits.len() % 2 != 0 {
        return Err(HexConvError::OddParity(src.to_owned()));
    }
    digits
        .chunks_exact(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(HexConvError::NonHex(src.to_owned())),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip() {
        let bytes = vec![0x00, 0x0f, 0xf0, 0xff];
        assert_eq!(hex_of_bytes(&bytes), "0x000ff0ff");
        assert_eq!(bytes_of_hex(&hex_of_bytes(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(
            bytes_of_hex("0xabc"),
            Err(HexConvError::OddParity("0xabc".into()))
        );
        assert_eq!(bytes_of_hex("0xzz"), Err(HexConvError::NonHex("0xzz".into())));
        assert_eq!(bytes_of_hex("0xé"), Err(HexConvError::NonHex("0xé".into())));
        assert_eq!(bytes_of_hex("0x").unwrap(), Vec::<u8>::new());
    }
}
