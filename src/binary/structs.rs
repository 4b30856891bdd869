use std::any::type_name;
use std::sync::Arc;

use crate::binary::{read_object_code, write_length, write_object_code};
use crate::context::Context;
use crate::conv::{Decode, Encode, FieldSource, FieldVisitor, Struct, StructDecode};
use crate::error::{DataError, Error, ParseError, Result};
use crate::field::FieldDescriptor;
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::{LengthPrefix, TypeSettings};

/// Prefix width of optional fields that configure none.
const DEFAULT_OPTIONAL_PREFIX: LengthPrefix = LengthPrefix::Uint32;

fn optional_prefix(desc: &FieldDescriptor) -> LengthPrefix {
    desc.settings.length_prefix().unwrap_or(DEFAULT_OPTIONAL_PREFIX)
}

/// Writes the object code of `T`, if configured, followed by its fields.
pub fn encode_struct<T: Struct>(
    value: &T,
    s: &Session<'_>,
    ts: &TypeSettings,
    buf: &mut Vec<u8>,
) -> Result<()> {
    write_object_code(ts, buf);
    encode_fields(value, s, buf)
}

/// Writes the annotated fields of `value` in position order.
pub fn encode_fields<T: Struct>(value: &T, s: &Session<'_>, buf: &mut Vec<u8>) -> Result<()> {
    let fields = s.api().fields::<T>()?;
    for desc in fields.iter() {
        let mut writer = FieldWriter {
            s,
            desc,
            buf: &mut *buf,
        };
        value
            .visit_field(desc.index, &mut writer)
            .map_err(|err| err.in_field::<T>("encode", desc.name))?;
    }
    Ok(())
}

struct FieldWriter<'s, 'a> {
    s: &'s Session<'a>,
    desc: &'s FieldDescriptor,
    buf: &'s mut Vec<u8>,
}

impl FieldVisitor for FieldWriter<'_, '_> {
    fn visit<V: Encode>(&mut self, value: &V) -> Result<()> {
        let desc = self.desc;
        if desc.inlined {
            return value.encode_inlined_bin(self.s, self.buf);
        }
        if desc.optional {
            let prefix = optional_prefix(desc);
            if value.is_nil() {
                return write_length(prefix, 0, self.buf);
            }
            let mut payload = Vec::new();
            self.s
                .encode_nested(value, desc.settings_override(), &mut payload)?;
            if payload.is_empty() {
                return Err(DataError::EmptyOptionalPayload {
                    type_name: type_name::<V>(),
                }
                .into());
            }
            write_length(prefix, payload.len(), self.buf)?;
            self.buf.extend_from_slice(&payload);
            return Ok(());
        }
        self.s.encode_nested(value, desc.settings_override(), self.buf)
    }
}

/// Consumes and checks the object code of `T`, if configured, then decodes its fields.
pub fn decode_struct<T: StructDecode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    p: &mut ByteParser<'_>,
) -> Result<T> {
    read_object_code::<T>(ts, p)?;
    decode_fields::<T>(s, p)
}

/// Decodes the annotated fields of `T` in position order and builds the value.
pub fn decode_fields<T: StructDecode>(s: &Session<'_>, p: &mut ByteParser<'_>) -> Result<T> {
    let mut reader = FieldReader {
        s,
        p,
        fields: s.api().fields::<T>()?,
        type_name: type_name::<T>(),
    };
    T::build(&mut reader)
}

struct FieldReader<'s, 'a, 'b> {
    s: &'s Session<'a>,
    p: &'s mut ByteParser<'b>,
    fields: Arc<[FieldDescriptor]>,
    type_name: &'static str,
}

impl FieldReader<'_, '_, '_> {
    fn read<V: Decode>(&mut self, desc: &FieldDescriptor) -> Result<V> {
        if desc.inlined {
            return V::decode_inlined_bin(self.s, self.p);
        }
        if !desc.optional {
            return self.s.decode_nested(desc.settings_override(), self.p);
        }
        let len = self.p.take_length(optional_prefix(desc))?;
        if len == 0 {
            return V::empty_value().ok_or_else(|| {
                DataError::NilValue {
                    type_name: desc.type_name,
                }
                .into()
            });
        }
        self.p.set_fit(len)?;
        let value = self.s.decode_nested(desc.settings_override(), self.p)?;
        self.p.enforce_target().map_err(|err| match err {
            ParseError::CloseWithResidue { residual } => Error::from(DataError::PayloadLengthMismatch {
                expected: len,
                actual: len - residual,
            }),
            other => other.into(),
        })?;
        Ok(value)
    }
}

impl FieldSource for FieldReader<'_, '_, '_> {
    fn fields(&self) -> Arc<[FieldDescriptor]> {
        Arc::clone(&self.fields)
    }

    fn context(&self) -> &Context {
        self.s.context()
    }

    fn field<V: Decode>(&mut self, desc: &FieldDescriptor) -> Result<V> {
        self.read(desc)
            .map_err(|err| err.in_named_field("decode", self.type_name, desc.name))
    }
}
