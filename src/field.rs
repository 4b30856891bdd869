//! Struct field annotations and their cached, parsed form
//!
//! `#[derive(Encode)]` turns the `#[serix(...)]` attribute of every annotated field
//! into a [`FieldSpec`]. The first time the engines see a struct type, its specs are
//! checked and sorted into [`FieldDescriptor`]s, which the [`FieldCache`] keeps for
//! the lifetime of the owning [`Api`](crate::Api).

use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use tracing::trace;

use crate::conv::{Kind, Struct};
use crate::error::ConfigError;
use crate::settings::TypeSettings;

/// Raw annotation of a single struct field, as emitted by the derive macro.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declaration index of the field within the struct
    pub index: usize,
    pub name: &'static str,
    pub position: u32,
    pub optional: bool,
    pub inlined: bool,
    pub omit_empty: bool,
    pub kind: Kind,
    pub type_name: &'static str,
    pub settings: TypeSettings,
}

/// Checked annotation of a struct field, with its resolved map key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub index: usize,
    pub name: &'static str,
    pub position: u32,
    pub optional: bool,
    pub inlined: bool,
    pub omit_empty: bool,
    pub kind: Kind,
    pub type_name: &'static str,
    pub settings: TypeSettings,
    pub map_key: String,
}

impl FieldDescriptor {
    fn from_spec(type_name: &'static str, spec: FieldSpec) -> Result<Self, ConfigError> {
        if spec.optional {
            if spec.inlined {
                return Err(ConfigError::InvalidOptional {
                    type_name,
                    field: spec.name,
                    reason: "optional and inlined are mutually exclusive",
                });
            }
            if !spec.kind.is_nullable() {
                return Err(ConfigError::InvalidOptional {
                    type_name,
                    field: spec.name,
                    reason: "only pointer and interface fields can be optional",
                });
            }
        }
        if spec.inlined && !spec.kind.is_inlinable() {
            return Err(ConfigError::InvalidInlined {
                type_name,
                field: spec.name,
                reason: "only struct and interface fields can be inlined",
            });
        }
        let map_key = match spec.settings.map_key() {
            Some(key) => key.to_owned(),
            None => camel_case(spec.name),
        };
        Ok(Self {
            index: spec.index,
            name: spec.name,
            position: spec.position,
            optional: spec.optional,
            inlined: spec.inlined,
            omit_empty: spec.omit_empty,
            kind: spec.kind,
            type_name: spec.type_name,
            settings: spec.settings,
            map_key,
        })
    }

    /// The field's settings override, or `None` when the annotation configures nothing.
    pub fn settings_override(&self) -> Option<&TypeSettings> {
        if self.settings == TypeSettings::default() {
            None
        } else {
            Some(&self.settings)
        }
    }
}

/// Checks the field annotations of the struct `type_name` and orders them by position.
pub fn parse_fields(
    type_name: &'static str,
    specs: Vec<FieldSpec>,
) -> Result<Vec<FieldDescriptor>, ConfigError> {
    let mut fields = specs
        .into_iter()
        .map(|spec| FieldDescriptor::from_spec(type_name, spec))
        .collect::<Result<Vec<_>, _>>()?;
    fields.sort_by_key(|f| f.position);
    for pair in fields.windows(2) {
        if pair[0].position == pair[1].position {
            return Err(ConfigError::DuplicatePosition {
                type_name,
                position: pair[0].position,
                first: pair[0].name,
                second: pair[1].name,
            });
        }
    }
    Ok(fields)
}

lazy_static! {
    static ref ACRONYMS: HashSet<&'static str> =
        ["ID", "URL", "URI", "JSON", "HTTP", "API", "UTXO", "NFT", "RPC"]
            .into_iter()
            .collect();
}

/// Converts a field name to the lowerCamelCase key used in the map representation.
///
/// Word boundaries are underscores; a word spelled as a known acronym collapses to a
/// single capital (`tx_ID` becomes `txId`).
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in name.split('_').filter(|w| !w.is_empty()) {
        if out.is_empty() {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            if ACRONYMS.contains(word) {
                out.push_str(&chars.as_str().to_lowercase());
            } else {
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Memoized field tables, one per struct type.
#[derive(Default)]
pub struct FieldCache {
    entries: RwLock<HashMap<TypeId, Arc<[FieldDescriptor]>>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed fields of `T`, parsing and caching them on first use.
    pub fn fields<T: Struct>(&self) -> Result<Arc<[FieldDescriptor]>, ConfigError> {
        let id = TypeId::of::<T>();
        if let Some(fields) = self.entries.read().get(&id) {
            return Ok(Arc::clone(fields));
        }
        let parsed: Arc<[FieldDescriptor]> = parse_fields(type_name::<T>(), T::field_specs())?.into();
        trace!(type_name = type_name::<T>(), fields = parsed.len(), "cached struct fields");
        Ok(Arc::clone(self.entries.write().entry(id).or_insert(parsed)))
    }
}
