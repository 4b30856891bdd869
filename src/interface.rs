//! Polymorphic values behind interface traits
//!
//! A field of type `Box<dyn I>` holds any of the concrete types registered under `I`
//! with [`Api::register_interface`](crate::Api::register_interface). The concrete
//! type is identified on the wire by its object code: structs and self-describing
//! types write the code themselves, as the first part of their own encoding, while
//! for other kinds the code is written here, ahead of the value. In map form the
//! latter are wrapped as `{"type": code, "value": ..}`.
//!
//! The [`Encode`](crate::Encode) and [`Decode`](crate::Decode) implementations for
//! `Box<dyn I>` are generated with the [`interface!`](crate::interface!) macro; the
//! functions of this module are what they call.

use serde_json::Value;
use tracing::trace;

use crate::conv::Object;
use crate::error::{ConfigError, DataError, Result};
use crate::map::{expect_object, json_type, read_code, TYPE_KEY};
use crate::parse::ByteParser;
use crate::registry::{Implementation, InterfaceObjects};
use crate::session::Session;
use crate::settings::{ObjectType, TypeDenotation};
use crate::OrderedMap;

/// Key holding the value of a non-struct implementation in map form.
pub const VALUE_KEY: &str = "value";

fn lookup<'o, I: ?Sized + Object>(
    objects: &'o InterfaceObjects<I>,
    value: &I,
) -> Result<(u32, &'o Implementation<I>)> {
    objects
        .resolve_by_type(value.as_any().type_id())
        .ok_or_else(|| {
            DataError::UnregisteredInterfaceType {
                interface: objects.interface(),
                type_name: value.type_name(),
            }
            .into()
        })
}

fn denotation<I: ?Sized>(objects: &InterfaceObjects<I>) -> Result<TypeDenotation> {
    objects.denotation().ok_or_else(|| {
        ConfigError::InterfaceNotRegistered {
            interface: objects.interface(),
        }
        .into()
    })
}

fn by_code<I: ?Sized>(objects: &InterfaceObjects<I>, code: u32) -> Result<&Implementation<I>> {
    let imp = objects.resolve_by_code(code).ok_or(DataError::UnknownObjectCode {
        interface: objects.interface(),
        code,
    })?;
    trace!(
        interface = objects.interface(),
        code,
        type_name = imp.type_name(),
        "resolved interface implementation"
    );
    Ok(imp)
}

/// Width of the object codes shared by every implementation of `I`.
pub fn type_denotation<I: ?Sized + 'static>(s: &Session<'_>) -> Result<Option<TypeDenotation>> {
    Ok(s.api().interfaces().get::<I>()?.denotation())
}

pub fn encode_bin<I: ?Sized + Object>(s: &Session<'_>, value: &I, buf: &mut Vec<u8>) -> Result<()> {
    let objects = s.api().interfaces().get::<I>()?;
    let (code, imp) = lookup(&objects, value)?;
    if imp.writes_code() {
        ObjectType {
            code,
            denotation: denotation(&objects)?,
        }
        .write_to(buf);
    }
    imp.encode_bin(s, value.as_any(), buf)
}

/// Peeks the object code, then decodes and upcasts the implementation it names.
pub fn decode_bin<I: ?Sized + 'static>(s: &Session<'_>, p: &mut ByteParser<'_>) -> Result<Box<I>> {
    let objects = s.api().interfaces().get::<I>()?;
    let width = denotation(&objects)?;
    let imp = by_code(&objects, p.peek_code(width)?)?;
    if imp.writes_code() {
        p.take_code(width)?;
    }
    imp.decode_bin(s, p)
}

pub fn encode_map<I: ?Sized + Object>(s: &Session<'_>, value: &I) -> Result<Value> {
    let objects = s.api().interfaces().get::<I>()?;
    let (code, imp) = lookup(&objects, value)?;
    let inner = imp.encode_map(s, value.as_any())?;
    if !imp.writes_code() {
        return Ok(inner);
    }
    let mut obj = OrderedMap::new();
    obj.insert(TYPE_KEY.to_owned(), Value::from(code));
    obj.insert(VALUE_KEY.to_owned(), inner);
    Ok(Value::Object(obj))
}

pub fn decode_map<I: ?Sized + 'static>(s: &Session<'_>, v: &Value) -> Result<Box<I>> {
    let objects = s.api().interfaces().get::<I>()?;
    let imp = by_code(&objects, read_code(expect_object(v)?)?)?;
    if !imp.writes_code() {
        return imp.decode_map(s, v);
    }
    match v.get(VALUE_KEY) {
        Some(inner) => imp.decode_map(s, inner),
        None => Err(DataError::MissingKey {
            key: VALUE_KEY.to_owned(),
        }
        .into()),
    }
}

/// Splices the entries of the concrete object into the dictionary of a parent struct.
pub fn encode_inlined_map<I: ?Sized + Object>(
    s: &Session<'_>,
    value: &I,
    out: &mut OrderedMap,
) -> Result<()> {
    match encode_map(s, value)? {
        Value::Object(entries) => {
            out.extend(entries);
            Ok(())
        }
        other => Err(DataError::UnexpectedValue {
            expected: "object",
            found: json_type(&other),
        }
        .into()),
    }
}

pub fn decode_inlined_map<I: ?Sized + 'static>(s: &Session<'_>, obj: &OrderedMap) -> Result<Box<I>> {
    decode_map(s, &Value::Object(obj.clone()))
}

/// Implements [`Encode`](crate::Encode) and [`Decode`](crate::Decode) for
/// `Box<dyn I>`, where the interface trait `I` has [`Object`](crate::Object) as a
/// supertrait.
///
/// ```ignore
/// pub trait Shape: serix::Object {
///     fn area(&self) -> f64;
/// }
///
/// serix::interface!(dyn Shape);
/// ```
#[macro_export]
macro_rules! interface {
    (dyn $($iface:tt)+) => {
        impl $crate::Encode for ::std::boxed::Box<dyn $($iface)+> {
            const KIND: $crate::Kind = $crate::Kind::Interface;

            fn encode_bin(
                &self,
                s: &$crate::Session<'_>,
                _: &$crate::TypeSettings,
                buf: &mut ::std::vec::Vec<u8>,
            ) -> $crate::Result<()> {
                $crate::interface::encode_bin::<dyn $($iface)+>(s, &**self, buf)
            }

            fn encode_map(
                &self,
                s: &$crate::Session<'_>,
                _: &$crate::TypeSettings,
            ) -> $crate::Result<$crate::Value> {
                $crate::interface::encode_map::<dyn $($iface)+>(s, &**self)
            }

            fn type_denotation(
                s: &$crate::Session<'_>,
            ) -> $crate::Result<::std::option::Option<$crate::settings::TypeDenotation>> {
                $crate::interface::type_denotation::<dyn $($iface)+>(s)
            }

            fn encode_inlined_bin(
                &self,
                s: &$crate::Session<'_>,
                buf: &mut ::std::vec::Vec<u8>,
            ) -> $crate::Result<()> {
                $crate::interface::encode_bin::<dyn $($iface)+>(s, &**self, buf)
            }

            fn encode_inlined_map(
                &self,
                s: &$crate::Session<'_>,
                out: &mut $crate::OrderedMap,
            ) -> $crate::Result<()> {
                $crate::interface::encode_inlined_map::<dyn $($iface)+>(s, &**self, out)
            }
        }

        impl $crate::Decode for ::std::boxed::Box<dyn $($iface)+> {
            fn decode_bin(
                s: &$crate::Session<'_>,
                _: &$crate::TypeSettings,
                p: &mut $crate::ByteParser<'_>,
            ) -> $crate::Result<Self> {
                $crate::interface::decode_bin::<dyn $($iface)+>(s, p)
            }

            fn decode_map(
                s: &$crate::Session<'_>,
                _: &$crate::TypeSettings,
                v: &$crate::Value,
            ) -> $crate::Result<Self> {
                $crate::interface::decode_map::<dyn $($iface)+>(s, v)
            }

            fn decode_inlined_bin(
                s: &$crate::Session<'_>,
                p: &mut $crate::ByteParser<'_>,
            ) -> $crate::Result<Self> {
                $crate::interface::decode_bin::<dyn $($iface)+>(s, p)
            }

            fn decode_inlined_map(
                s: &$crate::Session<'_>,
                obj: &$crate::OrderedMap,
            ) -> $crate::Result<Self> {
                $crate::interface::decode_inlined_map::<dyn $($iface)+>(s, obj)
            }
        }
    };
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::api::{Api, Options};
    use crate::context::Context;
    use crate::error::{ConfigError, DataError, Error};
    use crate::registry::Implementation;
    use crate::settings::{ObjectType, TypeSettings};
    use crate::Object;

    trait Level: Object {
        fn level(&self) -> u32;
    }

    impl Level for u16 {
        fn level(&self) -> u32 {
            u32::from(*self)
        }
    }

    impl Level for bool {
        fn level(&self) -> u32 {
            u32::from(*self)
        }
    }

    crate::interface!(dyn Level);

    fn api() -> Api {
        let api = Api::new();
        api.register_type_settings::<u16>(TypeSettings::new().with_object_type(ObjectType::uint8(1)))
            .unwrap();
        api.register_type_settings::<bool>(TypeSettings::new().with_object_type(ObjectType::uint8(2)))
            .unwrap();
        api.register_interface::<dyn Level>(vec![
            Implementation::new::<u16>(|n| Box::new(n)),
            Implementation::new::<bool>(|b| Box::new(b)),
        ])
        .unwrap();
        api
    }

    #[test]
    fn scalar_implementations_carry_codes() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new();
        let value: Box<dyn Level> = Box::new(0x0102u16);
        let bytes = api.encode(&ctx, &value, &opts).unwrap();
        assert_eq!(bytes, vec![1, 2, 1]);
        let (back, used) = api.decode_value::<Box<dyn Level>>(&ctx, &bytes, &opts).unwrap();
        assert_eq!((back.level(), used), (0x0102, 3));

        let flag: Box<dyn Level> = Box::new(true);
        let map = api.map_encode(&ctx, &flag, &opts).unwrap();
        assert_eq!(map, json!({"type": 2, "value": true}));
        let mut back: Box<dyn Level> = Box::new(0u16);
        api.map_decode(&ctx, &map, &mut back, &opts).unwrap();
        assert_eq!(back.level(), 1);
    }

    #[test]
    fn polymorphism_errors() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new();
        assert!(matches!(
            api.decode_value::<Box<dyn Level>>(&ctx, &[9, 0], &opts),
            Err(Error::Data(DataError::UnknownObjectCode { code: 9, .. }))
        ));

        let bare = Api::new();
        let value: Box<dyn Level> = Box::new(3u16);
        assert!(matches!(
            bare.encode(&ctx, &value, &opts),
            Err(Error::Config(ConfigError::InterfaceNotRegistered { .. }))
        ));
    }

    #[test]
    fn registration_requires_object_type() {
        let api = Api::new();
        assert!(matches!(
            api.register_interface::<dyn Level>(vec![Implementation::new::<u16>(|n| Box::new(n))]),
            Err(Error::Config(ConfigError::MissingObjectType { .. }))
        ));
    }
}
