//! Structural codec with a deterministic binary format and an ordered map representation
//!
//! # Overview
//!
//! `serix` transcodes Rust values to and from two representations: a compact binary
//! wire format, and an ordered map (a [`serde_json::Value`] whose objects keep their
//! insertion order) that renders to JSON. Both are driven by the *structure* of the
//! value: structs are walked field by field, collections element by element, and
//! primitives are written in fixed little-endian layouts. Nothing is described by a
//! separate schema.
//!
//! Whatever the structure leaves open is supplied by three sources of configuration,
//! merged field by field with the first non-empty value winning:
//!
//!   1. a per-call override in [`Options`];
//!   2. the field annotations written with `#[serix(...)]` on struct fields;
//!   3. the [`TypeSettings`] registered for the value's type on an [`Api`].
//!
//! This is where length-prefix widths, object type codes, map keys, and the bounds and
//! ordering rules applied to collections under validation come from.
//!
//! # Binary format
//!
//! ```text
//! [object code]? ( raw bytes | struct fields | [length][payload] | [count][elements] )
//! ```
//!
//! Sets and maps are always written in canonical order, sorted by the bytes of each
//! element, so that equal values always produce equal encodings. See [`binary`] for
//! the details of each kind.
//!
//! # Polymorphism
//!
//! Trait objects are supported for traits that have [`Object`] as a supertrait: the
//! concrete types are registered under the trait with their object codes, and the
//! [`interface!`] macro implements the codec traits for `Box<dyn Trait>`.
//!
//! # Example
//!
//! ```
//! use serix::{Api, Context, Decode, Encode, LengthPrefix, Options, TypeSettings};
//!
//! #[derive(Debug, PartialEq, Encode, Decode)]
//! struct Transfer {
//!     #[serix(position = 0, length_prefix = u8)]
//!     memo: String,
//!     #[serix(position = 1)]
//!     amount: u64,
//! }
//!
//! let api = Api::new();
//! let ctx = Context::new();
//! let opts = Options::new();
//! let tx = Transfer { memo: "hi".into(), amount: 7 };
//!
//! let bytes = api.encode(&ctx, &tx, &opts).unwrap();
//! assert_eq!(bytes, [2, b'h', b'i', 7, 0, 0, 0, 0, 0, 0, 0]);
//! assert_eq!(api.decode_value::<Transfer>(&ctx, &bytes, &opts).unwrap(), (tx, 11));
//! # let _ = (LengthPrefix::Uint8, TypeSettings::new());
//! ```

extern crate self as serix;

pub mod api;
pub mod bigint;
pub mod binary;
pub mod collections;
pub mod context;
pub mod conv;
pub mod custom;
pub mod error;
pub mod field;
pub mod hexstring;
pub mod interface;
pub mod map;
pub mod parse;
pub mod pointer;
pub mod prim;
pub mod registry;
pub mod session;
pub mod settings;
pub mod time;

/// Ordered dictionary used by the map representation.
pub type OrderedMap = serde_json::Map<String, Value>;

pub use crate::api::{default_api, Api, Options};
pub use crate::context::{Context, ContextAware};
pub use crate::conv::{
    target::Target, Decode, Encode, FieldSource, FieldVisitor, Kind, Object, Struct, StructDecode,
};
pub use crate::custom::SelfCodec;
pub use crate::error::{BoxError, ConfigError, DataError, Error, LengthError, ParseError, Result};
pub use crate::field::{FieldDescriptor, FieldSpec};
pub use crate::parse::{ByteParser, ParseResult};
pub use crate::registry::Implementation;
pub use crate::session::Session;
pub use crate::settings::{
    ArrayRules, LengthPrefix, ObjectType, TypeDenotation, TypeSettings, ValidationMode,
};

pub use ::serde_json::Value;
pub use ::serix_derive::{Decode, Encode};
