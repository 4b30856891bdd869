//! Pointer kinds
//!
//! `Box<T>` is transparent. `Option<T>` is the nullable pointer: outside of an
//! `optional` struct field it must be `Some`, and it is the only way an absent
//! value can be represented.

use std::any::{type_name, TypeId};

use serde_json::Value;

use crate::conv::{Decode, Encode, Kind};
use crate::error::{DataError, Result};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::{TypeDenotation, TypeSettings};
use crate::OrderedMap;

impl<T: Encode> Encode for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Some(value) => s.encode_value(value, ts, buf),
            None => Err(DataError::NilValue {
                type_name: type_name::<Self>(),
            }
            .into()),
        }
    }

    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
        match self {
            Some(value) => s.map_encode_value(value, ts),
            None => Err(DataError::NilValue {
                type_name: type_name::<Self>(),
            }
            .into()),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn pointee() -> Option<(TypeId, &'static str)> {
        Some((TypeId::of::<T>(), type_name::<T>()))
    }

    fn type_denotation(s: &Session<'_>) -> Result<Option<TypeDenotation>> {
        T::type_denotation(s)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        s.decode_value::<T>(ts, p).map(Some)
    }

    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
        if v.is_null() {
            return Err(DataError::NilValue {
                type_name: type_name::<Self>(),
            }
            .into());
        }
        s.map_decode_value::<T>(ts, v).map(Some)
    }

    fn empty_value() -> Option<Self> {
        Some(None)
    }
}

impl<T: Encode> Encode for Box<T> {
    const KIND: Kind = T::KIND;

    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        s.encode_value(&**self, ts, buf)
    }

    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
        s.map_encode_value(&**self, ts)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }

    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn as_byte(&self) -> Option<u8> {
        (**self).as_byte()
    }

    fn pointee() -> Option<(TypeId, &'static str)> {
        Some((TypeId::of::<T>(), type_name::<T>()))
    }

    fn type_denotation(s: &Session<'_>) -> Result<Option<TypeDenotation>> {
        T::type_denotation(s)
    }

    fn encode_inlined_bin(&self, s: &Session<'_>, buf: &mut Vec<u8>) -> Result<()> {
        (**self).encode_inlined_bin(s, buf)
    }

    fn encode_inlined_map(&self, s: &Session<'_>, out: &mut OrderedMap) -> Result<()> {
        (**self).encode_inlined_map(s, out)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        s.decode_value::<T>(ts, p).map(Box::new)
    }

    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
        s.map_decode_value::<T>(ts, v).map(Box::new)
    }

    fn empty_value() -> Option<Self> {
        T::empty_value().map(Box::new)
    }

    fn from_byte(b: u8) -> Option<Self> {
        T::from_byte(b).map(Box::new)
    }

    fn decode_inlined_bin(s: &Session<'_>, p: &mut ByteParser<'_>) -> Result<Self> {
        T::decode_inlined_bin(s, p).map(Box::new)
    }

    fn decode_inlined_map(s: &Session<'_>, obj: &OrderedMap) -> Result<Self> {
        T::decode_inlined_map(s, obj).map(Box::new)
    }
}

#[cfg(test)]
mod test {
    use crate::api::{Api, Options};
    use crate::context::Context;
    use crate::error::{DataError, Error};
    use crate::settings::{LengthPrefix, TypeSettings};

    #[test]
    fn option_outside_optional_field() {
        let api = Api::new();
        let ctx = Context::new();
        let opts = Options::new();
        assert_eq!(api.encode(&ctx, &Some(5u8), &opts).unwrap(), vec![5]);
        assert!(matches!(
            api.encode(&ctx, &None::<u8>, &opts),
            Err(Error::Data(DataError::NilValue { .. }))
        ));
        assert_eq!(
            api.decode_value::<Option<u8>>(&ctx, &[5], &opts).unwrap(),
            (Some(5), 1)
        );
    }

    #[test]
    fn pointee_settings_apply() {
        let api = Api::new();
        api.register_type_settings::<String>(
            TypeSettings::new().with_length_prefix(LengthPrefix::Uint8),
        )
        .unwrap();
        let ctx = Context::new();
        let opts = Options::new();
        let boxed = Box::new(String::from("hi"));
        assert_eq!(api.encode(&ctx, &boxed, &opts).unwrap(), vec![2, b'h', b'i']);
        assert_eq!(
            api.encode(&ctx, &Some(String::from("hi")), &opts).unwrap(),
            vec![2, b'h', b'i']
        );
    }
}
