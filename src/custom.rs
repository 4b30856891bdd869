//! Self-describing types
//!
//! Types that know how to encode themselves implement [`SelfCodec`] and derive
//! `Encode`/`Decode` with the container attribute `#[serix(custom)]`. The engine
//! still handles their object code, if one is registered, and runs their validators;
//! everything else is left to the type.
//!
//! ```ignore
//! #[derive(Encode, Decode)]
//! #[serix(custom)]
//! struct Version(u8, u8);
//!
//! impl SelfCodec for Version { /* ... */ }
//! ```

use std::any::type_name;

use serde_json::Value;

use crate::binary::{read_object_code, write_object_code};
use crate::context::Context;
use crate::error::{BoxError, DataError, Error, Result};
use crate::map::{check_type, expect_object, TYPE_KEY};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::TypeSettings;
use crate::OrderedMap;

/// Codec implemented by the type itself, for both representations.
pub trait SelfCodec: Sized {
    /// Produces the binary encoding of `self`, excluding any object code.
    fn encode_bytes(&self, ctx: &Context) -> Result<Vec<u8>, BoxError>;

    /// Decodes a value from the start of `bytes`, returning it along with the number
    /// of bytes it occupied.
    fn decode_bytes(ctx: &Context, bytes: &[u8]) -> Result<(Self, usize), BoxError>;

    /// Produces the map representation of `self`.
    ///
    /// Types with a registered object code must produce an object, which receives
    /// the code under the `"type"` key.
    fn encode_map_value(&self, ctx: &Context) -> Result<Value, BoxError>;

    fn decode_map_value(ctx: &Context, v: &Value) -> Result<Self, BoxError>;
}

fn codec_error<T>(source: BoxError) -> Error {
    DataError::Codec {
        type_name: type_name::<T>(),
        source,
    }
    .into()
}

pub fn encode_bin<T: SelfCodec>(
    value: &T,
    s: &Session<'_>,
    ts: &TypeSettings,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let bytes = value.encode_bytes(s.context()).map_err(codec_error::<T>)?;
    write_object_code(ts, buf);
    buf.extend_from_slice(&bytes);
    Ok(())
}

pub fn decode_bin<T: SelfCodec>(
    s: &Session<'_>,
    ts: &TypeSettings,
    p: &mut ByteParser<'_>,
) -> Result<T> {
    read_object_code::<T>(ts, p)?;
    let rest = p.rest();
    let (value, consumed) = T::decode_bytes(s.context(), rest).map_err(codec_error::<T>)?;
    if consumed > rest.len() {
        return Err(DataError::ConsumedOverflow {
            type_name: type_name::<T>(),
            consumed,
            available: rest.len(),
        }
        .into());
    }
    p.consume(consumed)?;
    Ok(value)
}

pub fn encode_map<T: SelfCodec>(value: &T, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
    let inner = value
        .encode_map_value(s.context())
        .map_err(codec_error::<T>)?;
    let object_type = match ts.object_type() {
        Some(object_type) => object_type,
        None => return Ok(inner),
    };
    let entries = match inner {
        Value::Object(entries) => entries,
        other => {
            return Err(DataError::UnexpectedValue {
                expected: "object",
                found: crate::map::json_type(&other),
            }
            .into())
        }
    };
    let mut obj = OrderedMap::new();
    obj.insert(TYPE_KEY.to_owned(), Value::from(object_type.code));
    obj.extend(entries.into_iter().filter(|(key, _)| key != TYPE_KEY));
    Ok(Value::Object(obj))
}

pub fn decode_map<T: SelfCodec>(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<T> {
    if ts.object_type().is_none() {
        return T::decode_map_value(s.context(), v).map_err(codec_error::<T>);
    }
    let obj = expect_object(v)?;
    check_type::<T>(ts, obj)?;
    let mut body = obj.clone();
    body.remove(TYPE_KEY);
    T::decode_map_value(s.context(), &Value::Object(body)).map_err(codec_error::<T>)
}
