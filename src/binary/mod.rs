//! Binary wire format
//!
//! Handlers for each [`Kind`](crate::Kind) of value, called from the [`Encode`] and
//! [`Decode`] implementations. Everything is written little-endian; a value is laid
//! out as
//!
//! ```text
//! [object code]? ( raw bytes | struct fields | [length][payload] | [count][elements] )
//! ```
//!
//! where the object code is present only for types whose settings configure one.
//!
//! [`Encode`]: crate::Encode
//! [`Decode`]: crate::Decode

use std::any::type_name;

use crate::conv::target::Target;
use crate::error::{DataError, Result};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::{LengthPrefix, TypeSettings};

pub mod seq;
pub mod structs;

pub use seq::Shape;
pub use structs::{decode_fields, decode_struct, encode_fields, encode_struct};

/// Writes `len` with the given prefix width.
pub(crate) fn write_length(prefix: LengthPrefix, len: usize, buf: &mut Vec<u8>) -> Result<()> {
    match prefix.write_to(len, buf) {
        Some(_) => Ok(()),
        None => Err(DataError::LengthPrefixOverflow { prefix, len }.into()),
    }
}

/// Writes the object code configured in `ts`, if any.
pub fn write_object_code(ts: &TypeSettings, buf: &mut Vec<u8>) {
    if let Some(object_type) = ts.object_type() {
        object_type.write_to(buf);
    }
}

/// Consumes the object code configured in `ts`, if any, and checks that it matches.
pub fn read_object_code<T: ?Sized>(ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<()> {
    if let Some(object_type) = ts.object_type() {
        let actual = p.take_code(object_type.denotation)?;
        if actual != object_type.code {
            return Err(DataError::ObjectCodeMismatch {
                type_name: type_name::<T>(),
                expected: object_type.code,
                actual,
            }
            .into());
        }
    }
    Ok(())
}

/// Writes a length-prefixed run of bytes, as used for strings and byte sequences.
pub fn encode_byte_run<T: ?Sized>(
    s: &Session<'_>,
    ts: &TypeSettings,
    bytes: &[u8],
    buf: &mut Vec<u8>,
) -> Result<()> {
    let prefix = ts.require_length_prefix(type_name::<T>())?;
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_byte_len(bytes.len())?;
        }
    }
    write_length(prefix, bytes.len(), buf)?;
    buf.push_all(bytes);
    Ok(())
}

/// Consumes a length-prefixed run of bytes.
///
/// The length bounds are checked before the payload is touched.
pub fn decode_byte_run<'a, T: ?Sized>(
    s: &Session<'_>,
    ts: &TypeSettings,
    p: &mut ByteParser<'a>,
) -> Result<&'a [u8]> {
    let prefix = ts.require_length_prefix(type_name::<T>())?;
    let len = p.take_length(prefix)?;
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_byte_len(len)?;
        }
    }
    Ok(p.consume(len)?)
}

/// Writes a fixed-length run of bytes, preceded by its length only when a prefix
/// is configured.
pub fn encode_byte_array(ts: &TypeSettings, bytes: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    if let Some(prefix) = ts.length_prefix() {
        write_length(prefix, bytes.len(), buf)?;
    }
    buf.push_all(bytes);
    Ok(())
}

pub fn decode_byte_array<const N: usize>(
    ts: &TypeSettings,
    p: &mut ByteParser<'_>,
) -> Result<[u8; N]> {
    if let Some(prefix) = ts.length_prefix() {
        let len = p.take_length(prefix)?;
        if len != N {
            return Err(DataError::FixedLength {
                expected: N,
                actual: len,
            }
            .into());
        }
    }
    Ok(p.consume_arr::<N>()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::{Api, Options};
    use crate::context::Context;
    use crate::error::{Error, LengthError};
    use crate::settings::{ArrayRules, ObjectType};

    #[test]
    fn object_code_checked() {
        let ts = TypeSettings::new().with_object_type(ObjectType::uint32(0x0102));
        let mut buf = Vec::new();
        write_object_code(&ts, &mut buf);
        assert_eq!(buf, vec![0x02, 0x01, 0, 0]);
        let mut p = ByteParser::new(&buf);
        read_object_code::<u8>(&ts, &mut p).unwrap();
        let other = TypeSettings::new().with_object_type(ObjectType::uint32(7));
        let mut p = ByteParser::new(&buf);
        assert!(matches!(
            read_object_code::<u8>(&other, &mut p),
            Err(Error::Data(DataError::ObjectCodeMismatch {
                expected: 7,
                actual: 0x0102,
                ..
            }))
        ));
    }

    #[test]
    fn byte_run_bounds_checked_before_payload() {
        let api = Api::new();
        let ctx = Context::new();
        let opts = Options::new().with_validation();
        let s = Session::new(&api, &ctx, &opts);
        let ts = TypeSettings::new()
            .with_length_prefix(LengthPrefix::Uint8)
            .with_array_rules(ArrayRules::new().with_max(2));
        let mut p = ByteParser::new(&[3]);
        assert!(matches!(
            decode_byte_run::<Vec<u8>>(&s, &ts, &mut p),
            Err(Error::Length(LengthError::TooLong { max: 2, actual: 3 }))
        ));
    }

    #[test]
    fn byte_array_prefix_must_match() {
        let ts = TypeSettings::new().with_length_prefix(LengthPrefix::Uint8);
        let mut buf = Vec::new();
        encode_byte_array(&ts, &[9, 9], &mut buf).unwrap();
        assert_eq!(buf, vec![2, 9, 9]);
        let mut p = ByteParser::new(&buf);
        assert_eq!(decode_byte_array::<2>(&ts, &mut p).unwrap(), [9, 9]);
        let mut p = ByteParser::new(&buf);
        assert!(matches!(
            decode_byte_array::<3>(&ts, &mut p),
            Err(Error::Data(DataError::FixedLength {
                expected: 3,
                actual: 2
            }))
        ));
    }
}
