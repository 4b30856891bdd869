//! Scalar types: booleans, fixed-width integers, floats and strings

use serde_json::Value;

use crate::binary::{decode_byte_run, encode_byte_run};
use crate::conv::{target::Target, Decode, Encode, Kind};
use crate::error::{DataError, Result};
use crate::map::{
    check_byte_len, expect_bool, expect_str, float_from_value, float_value, signed_from_value,
    unsigned_from_value,
};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::TypeSettings;

impl Encode for bool {
    const KIND: Kind = Kind::Bool;

    fn encode_bin(&self, _: &Session<'_>, _: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        buf.push_one(u8::from(*self));
        Ok(())
    }

    fn encode_map(&self, _: &Session<'_>, _: &TypeSettings) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

impl Decode for bool {
    fn decode_bin(_: &Session<'_>, _: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        match p.take_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DataError::InvalidBool(other).into()),
        }
    }

    fn decode_map(_: &Session<'_>, _: &TypeSettings, v: &Value) -> Result<Self> {
        expect_bool(v)
    }

    fn empty_value() -> Option<Self> {
        Some(false)
    }
}

/// Fixed-width integers, little-endian on the wire. In map form, 64-bit integers are
/// decimal strings so that JSON consumers with double-precision numbers keep every digit.
macro_rules! impl_int {
    ($($t:ty => $kind:expr, $from:ident, $wide:literal);* $(;)?) => {
        $(
            impl Encode for $t {
                const KIND: Kind = $kind;

                fn encode_bin(&self, _: &Session<'_>, _: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
                    buf.push_many(self.to_le_bytes());
                    Ok(())
                }

                fn encode_map(&self, _: &Session<'_>, _: &TypeSettings) -> Result<Value> {
                    Ok(if $wide {
                        Value::String(self.to_string())
                    } else {
                        Value::from(*self)
                    })
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0
                }

                fn as_byte(&self) -> Option<u8> {
                    <u8 as TryFrom<$t>>::try_from(*self)
                        .ok()
                        .filter(|_| matches!(Self::KIND, Kind::Uint(8)))
                }
            }

            impl Decode for $t {
                fn decode_bin(_: &Session<'_>, _: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
                    Ok(<$t>::from_le_bytes(p.consume_arr()?))
                }

                fn decode_map(_: &Session<'_>, _: &TypeSettings, v: &Value) -> Result<Self> {
                    $from::<$t>(v)
                }

                fn empty_value() -> Option<Self> {
                    Some(0)
                }

                fn from_byte(b: u8) -> Option<Self> {
                    <$t as TryFrom<u8>>::try_from(b)
                        .ok()
                        .filter(|_| matches!(Self::KIND, Kind::Uint(8)))
                }
            }
        )*
    };
}

impl_int! {
    u8 => Kind::Uint(8), unsigned_from_value, false;
    u16 => Kind::Uint(16), unsigned_from_value, false;
    u32 => Kind::Uint(32), unsigned_from_value, false;
    u64 => Kind::Uint(64), unsigned_from_value, true;
    i8 => Kind::Int(8), signed_from_value, false;
    i16 => Kind::Int(16), signed_from_value, false;
    i32 => Kind::Int(32), signed_from_value, false;
    i64 => Kind::Int(64), signed_from_value, true;
}

macro_rules! impl_float {
    ($($t:ty => $bits:literal);* $(;)?) => {
        $(
            impl Encode for $t {
                const KIND: Kind = Kind::Float($bits);

                fn encode_bin(&self, _: &Session<'_>, _: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
                    buf.push_many(self.to_le_bytes());
                    Ok(())
                }

                fn encode_map(&self, _: &Session<'_>, _: &TypeSettings) -> Result<Value> {
                    Ok(float_value(f64::from(*self)))
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0.0
                }
            }

            impl Decode for $t {
                fn decode_bin(_: &Session<'_>, _: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
                    Ok(<$t>::from_le_bytes(p.consume_arr()?))
                }

                fn decode_map(_: &Session<'_>, _: &TypeSettings, v: &Value) -> Result<Self> {
                    Ok(float_from_value(v)? as $t)
                }

                fn empty_value() -> Option<Self> {
                    Some(0.0)
                }
            }
        )*
    };
}

impl_float! {
    f32 => 32;
    f64 => 64;
}

impl Encode for String {
    const KIND: Kind = Kind::String;

    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        encode_byte_run::<Self>(s, ts, self.as_bytes(), buf)
    }

    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
        check_byte_len(s, ts, self.len())?;
        Ok(Value::String(self.clone()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Decode for String {
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        let bytes = decode_byte_run::<Self>(s, ts, p)?;
        let text = std::str::from_utf8(bytes).map_err(DataError::from)?;
        Ok(text.to_owned())
    }

    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
        let text = expect_str(v)?;
        check_byte_len(s, ts, text.len())?;
        Ok(text.to_owned())
    }

    fn empty_value() -> Option<Self> {
        Some(String::new())
    }
}
