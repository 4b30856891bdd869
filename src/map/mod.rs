//! Ordered map representation
//!
//! Values are converted to [`serde_json::Value`]s whose objects keep insertion order,
//! so that the JSON text produced from them is deterministic:
//!
//!   * 8/16/32-bit integers and floats become numbers, 64-bit integers become
//!     decimal strings (numbers are also accepted when decoding);
//!   * byte-runs become `0x`-prefixed hex strings;
//!   * structs become objects, with their object code under the reserved key `"type"`;
//!   * sequences and sets become arrays, maps become objects keyed by the string
//!     form of their keys.

use std::any::type_name;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::error::{DataError, Result};
use crate::hexstring::{bytes_of_hex, hex_of_bytes};
use crate::session::Session;
use crate::settings::TypeSettings;
use crate::OrderedMap;

pub mod seq;
pub mod structs;

pub use structs::{decode_fields, decode_struct, encode_fields, encode_struct};

/// Reserved key holding the object code of a struct.
pub const TYPE_KEY: &str = "type";

/// Short name of the JSON type of `v`, for error messages.
pub(crate) fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn unexpected(expected: &'static str, found: &Value) -> crate::error::Error {
    DataError::UnexpectedValue {
        expected,
        found: json_type(found),
    }
    .into()
}

pub fn expect_object(v: &Value) -> Result<&OrderedMap> {
    v.as_object().ok_or_else(|| unexpected("object", v))
}

pub fn expect_array(v: &Value) -> Result<&Vec<Value>> {
    v.as_array().ok_or_else(|| unexpected("array", v))
}

pub fn expect_str(v: &Value) -> Result<&str> {
    v.as_str().ok_or_else(|| unexpected("string", v))
}

pub fn expect_bool(v: &Value) -> Result<bool> {
    v.as_bool().ok_or_else(|| unexpected("boolean", v))
}

/// Hex string form of a byte-run.
pub fn hex_value(bytes: &[u8]) -> Value {
    Value::String(hex_of_bytes(bytes))
}

/// Parses the hex string form of a byte-run.
pub fn bytes_from_value(v: &Value) -> Result<Vec<u8>> {
    Ok(bytes_of_hex(expect_str(v)?).map_err(DataError::from)?)
}

fn out_of_range<N>(n: &Number) -> crate::error::Error {
    DataError::NumberOutOfRange {
        type_name: type_name::<N>(),
        value: n.to_string(),
    }
    .into()
}

fn parse_number<N: FromStr>(type_name: &'static str, text: &str) -> Result<N> {
    text.parse::<N>().map_err(|_| {
        DataError::NumberOutOfRange {
            type_name,
            value: text.to_owned(),
        }
        .into()
    })
}

/// Reads an unsigned integer from either a JSON number or a decimal string.
pub fn unsigned_from_value<N: TryFrom<u64>>(v: &Value) -> Result<N> {
    let wide: u64 = match v {
        Value::Number(n) => match n.as_u64() {
            Some(x) => x,
            None => return Err(out_of_range::<N>(n)),
        },
        Value::String(text) => parse_number::<u64>(type_name::<N>(), text)?,
        other => return Err(unexpected("unsigned integer", other)),
    };
    N::try_from(wide).map_err(|_| {
        DataError::NumberOutOfRange {
            type_name: type_name::<N>(),
            value: wide.to_string(),
        }
        .into()
    })
}

/// Reads a signed integer from either a JSON number or a decimal string.
pub fn signed_from_value<N: TryFrom<i64>>(v: &Value) -> Result<N> {
    let wide: i64 = match v {
        Value::Number(n) => match n.as_i64() {
            Some(x) => x,
            None => return Err(out_of_range::<N>(n)),
        },
        Value::String(text) => parse_number::<i64>(type_name::<N>(), text)?,
        other => return Err(unexpected("signed integer", other)),
    };
    N::try_from(wide).map_err(|_| {
        DataError::NumberOutOfRange {
            type_name: type_name::<N>(),
            value: wide.to_string(),
        }
        .into()
    })
}

/// Reads a float from a JSON number.
pub fn float_from_value(v: &Value) -> Result<f64> {
    v.as_f64().ok_or_else(|| unexpected("number", v))
}

/// JSON number for a float; non-finite values have no JSON form and become `null`.
pub fn float_value(x: f64) -> Value {
    Number::from_f64(x).map_or(Value::Null, Value::Number)
}

/// Inserts the object code configured in `ts`, if any, under [`TYPE_KEY`].
pub fn write_type(ts: &TypeSettings, obj: &mut OrderedMap) {
    if let Some(object_type) = ts.object_type() {
        obj.insert(TYPE_KEY.to_owned(), Value::from(object_type.code));
    }
}

/// Reads the object code under [`TYPE_KEY`].
pub fn read_code(obj: &OrderedMap) -> Result<u32> {
    match obj.get(TYPE_KEY) {
        Some(code) => unsigned_from_value(code),
        None => Err(DataError::MissingKey {
            key: TYPE_KEY.to_owned(),
        }
        .into()),
    }
}

/// Checks the object code of `T` configured in `ts`, if any, against the one in `obj`.
pub fn check_type<T: ?Sized>(ts: &TypeSettings, obj: &OrderedMap) -> Result<()> {
    if let Some(object_type) = ts.object_type() {
        let actual = read_code(obj)?;
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

/// Checks the byte-length bounds of a string or byte-run under validation.
pub fn check_byte_len(s: &Session<'_>, ts: &TypeSettings, len: usize) -> Result<()> {
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_byte_len(len)?;
        }
    }
    Ok(())
}
