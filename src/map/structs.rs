use std::any::type_name;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::conv::{Decode, Encode, FieldSource, FieldVisitor, Struct, StructDecode};
use crate::error::{DataError, Result};
use crate::field::FieldDescriptor;
use crate::map::{check_type, expect_object, write_type};
use crate::session::Session;
use crate::settings::TypeSettings;
use crate::OrderedMap;

/// Builds the object of a struct: its object code, if configured, then its fields.
pub fn encode_struct<T: Struct>(value: &T, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
    let mut obj = OrderedMap::new();
    write_type(ts, &mut obj);
    encode_fields(value, s, &mut obj)?;
    Ok(Value::Object(obj))
}

/// Inserts the entries of the annotated fields of `value` into `obj`, in position order.
pub fn encode_fields<T: Struct>(value: &T, s: &Session<'_>, obj: &mut OrderedMap) -> Result<()> {
    let fields = s.api().fields::<T>()?;
    for desc in fields.iter() {
        let mut writer = FieldMapWriter {
            s,
            desc,
            obj: &mut *obj,
        };
        value
            .visit_field(desc.index, &mut writer)
            .map_err(|err| err.in_field::<T>("encode", desc.name))?;
    }
    Ok(())
}

struct FieldMapWriter<'s, 'a> {
    s: &'s Session<'a>,
    desc: &'s FieldDescriptor,
    obj: &'s mut OrderedMap,
}

impl FieldVisitor for FieldMapWriter<'_, '_> {
    fn visit<V: Encode>(&mut self, value: &V) -> Result<()> {
        let desc = self.desc;
        if desc.inlined {
            return value.encode_inlined_map(self.s, self.obj);
        }
        if (desc.optional && value.is_nil()) || (desc.omit_empty && value.is_empty_value()) {
            return Ok(());
        }
        let entry = self.s.map_encode_nested(value, desc.settings_override())?;
        self.obj.insert(desc.map_key.clone(), entry);
        Ok(())
    }
}

/// Checks the object code of `T`, if configured, then interprets its fields.
pub fn decode_struct<T: StructDecode>(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<T> {
    let obj = expect_object(v)?;
    check_type::<T>(ts, obj)?;
    decode_fields::<T>(s, obj)
}

/// Interprets the annotated fields of `T` from `obj` and builds the value.
///
/// Keys that do not belong to any field are ignored.
pub fn decode_fields<T: StructDecode>(s: &Session<'_>, obj: &OrderedMap) -> Result<T> {
    let mut reader = FieldMapReader {
        s,
        obj,
        fields: s.api().fields::<T>()?,
        type_name: type_name::<T>(),
    };
    T::build(&mut reader)
}

struct FieldMapReader<'s, 'a> {
    s: &'s Session<'a>,
    obj: &'s OrderedMap,
    fields: Arc<[FieldDescriptor]>,
    type_name: &'static str,
}

impl FieldMapReader<'_, '_> {
    fn read<V: Decode>(&self, desc: &FieldDescriptor) -> Result<V> {
        if desc.inlined {
            return V::decode_inlined_map(self.s, self.obj);
        }
        match self.obj.get(&desc.map_key) {
            Some(Value::Null) | None if desc.optional || desc.omit_empty => {
                V::empty_value().ok_or_else(|| {
                    DataError::MissingKey {
                        key: desc.map_key.clone(),
                    }
                    .into()
                })
            }
            None => Err(DataError::MissingKey {
                key: desc.map_key.clone(),
            }
            .into()),
            Some(entry) => self.s.map_decode_nested(desc.settings_override(), entry),
        }
    }
}

impl FieldSource for FieldMapReader<'_, '_> {
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
