//! Core of the transcoding API
//!
//! This module contains the definitions of the high-level traits [`Encode`] and
//! [`Decode`], which every value the engine can handle implements. Each
//! implementation declares the [`Kind`] of value it is, and forwards to the handler
//! for that kind in [`binary`](crate::binary) or [`map`](crate::map); the engines
//! themselves never match on concrete types, so new kinds and wrappers can be added
//! by implementing the two traits.
//!
//! Structs get their implementations from the derive macros `Encode` and `Decode`,
//! which additionally implement [`Struct`] and [`StructDecode`]: a table of raw
//! field annotations, and index-based accessors that let the engines visit and
//! rebuild fields in the order dictated by the parsed
//! [`FieldDescriptor`](crate::field::FieldDescriptor)s.
//!
//! The submodule [`target`] offers the [`Target`](target::Target) trait, an
//! infallible analogue of [`std::io::Write`] used as the sink for binary output.

use std::any::{Any, TypeId};
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::field::{FieldDescriptor, FieldSpec};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::{TypeDenotation, TypeSettings};
use crate::OrderedMap;

pub mod target;

/// Runtime kind of an encodable type, used to select engine handlers and to
/// check field annotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    /// Signed integer of the given bit-width
    Int(u8),
    /// Unsigned integer of the given bit-width
    Uint(u8),
    /// IEEE float of the given bit-width
    Float(u8),
    String,
    /// Variable-length run of bytes
    Bytes,
    /// Fixed-length run of bytes
    ByteArray,
    Sequence,
    Array,
    Set,
    Map,
    Struct,
    Interface,
    Pointer,
    Time,
    BigInt,
    /// Self-describing value that encodes and decodes itself
    Custom,
}

impl Kind {
    /// Whether an `optional` field annotation is legal for this kind.
    pub const fn is_nullable(self) -> bool {
        matches!(self, Kind::Pointer | Kind::Interface)
    }

    /// Whether an `inlined` field annotation is legal for this kind.
    pub const fn is_inlinable(self) -> bool {
        matches!(self, Kind::Struct | Kind::Interface)
    }
}

/// Trait for types that can be turned into the binary wire format and into the
/// ordered map representation.
///
/// Implementations receive the already-merged [`TypeSettings`] for the value and
/// a [`Session`] that carries the registries and per-call options. Nested values
/// must be encoded through the session (see [`Session::encode_nested`]) so that
/// settings resolution and validators apply to them.
pub trait Encode: Sized + 'static {
    /// Kind tag consulted by the engines and the field annotation parser
    const KIND: Kind;

    /// Appends the binary encoding of `self` to `buf`.
    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()>;

    /// Produces the map representation of `self`.
    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value>;

    /// Whether `self` is the zero value, as consulted by `omit_empty` fields.
    fn is_empty_value(&self) -> bool {
        false
    }

    /// Whether `self` is an absent pointer, as consulted by `optional` fields.
    fn is_nil(&self) -> bool {
        false
    }

    /// Byte view of `self`, used to recognise byte sequences.
    fn as_byte(&self) -> Option<u8> {
        None
    }

    /// Type of the pointee for pointer kinds, used as a settings fallback.
    fn pointee() -> Option<(TypeId, &'static str)> {
        None
    }

    /// Width of the object type code that starts the binary encoding of values of
    /// this type, if there is one.
    fn type_denotation(s: &Session<'_>) -> Result<Option<TypeDenotation>> {
        Ok(s
            .api()
            .type_settings()
            .resolve::<Self>()
            .and_then(|ts| ts.object_type())
            .map(|ot| ot.denotation))
    }

    /// Appends the binary encoding of `self` as the inlined part of a parent struct.
    fn encode_inlined_bin(&self, _s: &Session<'_>, _buf: &mut Vec<u8>) -> Result<()> {
        Err(ConfigError::NotInlinable {
            type_name: std::any::type_name::<Self>(),
        }
        .into())
    }

    /// Splices the map entries of `self` into the dictionary of a parent struct.
    fn encode_inlined_map(&self, _s: &Session<'_>, _out: &mut OrderedMap) -> Result<()> {
        Err(ConfigError::NotInlinable {
            type_name: std::any::type_name::<Self>(),
        }
        .into())
    }
}

/// Trait providing the inverse operations of [`Encode`].
pub trait Decode: Encode {
    /// Consumes and interprets a value from the parser.
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self>;

    /// Interprets a value from its map representation.
    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self>;

    /// The zero value, used for absent `optional` and `omit_empty` fields.
    fn empty_value() -> Option<Self> {
        None
    }

    /// Inverse of [`Encode::as_byte`].
    fn from_byte(_b: u8) -> Option<Self> {
        None
    }

    /// Consumes the inlined part of a parent struct.
    fn decode_inlined_bin(_s: &Session<'_>, _p: &mut ByteParser<'_>) -> Result<Self> {
        Err(ConfigError::NotInlinable {
            type_name: std::any::type_name::<Self>(),
        }
        .into())
    }

    /// Reads the inlined entries of this value from the dictionary of a parent struct.
    fn decode_inlined_map(_s: &Session<'_>, _obj: &OrderedMap) -> Result<Self> {
        Err(ConfigError::NotInlinable {
            type_name: std::any::type_name::<Self>(),
        }
        .into())
    }
}

/// Field table and field accessors of a struct, generated by `#[derive(Encode)]`.
pub trait Struct: Encode {
    /// Raw annotations of every annotated field, in declaration order.
    fn field_specs() -> Vec<FieldSpec>;

    /// Calls `visitor` with the field at declaration index `index`.
    fn visit_field<V: FieldVisitor>(&self, index: usize, visitor: &mut V) -> Result<()>;
}

/// Callback invoked with each field value of a struct.
pub trait FieldVisitor {
    fn visit<T: Encode>(&mut self, value: &T) -> Result<()>;
}

/// Field-wise constructor of a struct, generated by `#[derive(Decode)]`.
pub trait StructDecode: Struct + Decode {
    /// Builds a value by requesting each field from `source` in position order.
    fn build<S: FieldSource>(source: &mut S) -> Result<Self>;
}

/// Supplier of decoded field values.
pub trait FieldSource {
    /// The parsed field descriptors of the struct under construction, sorted by position.
    fn fields(&self) -> Arc<[FieldDescriptor]>;

    /// The context of the call that is decoding the struct.
    fn context(&self) -> &Context;

    /// Decodes the value of the field described by `desc`.
    fn field<T: Decode>(&mut self, desc: &FieldDescriptor) -> Result<T>;
}

/// Supertrait required of interface traits, giving access to the concrete value
/// behind a trait object.
pub trait Object: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
