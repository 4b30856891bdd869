use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::conv::{Decode, Encode, Kind};
use crate::error::{ConfigError, DataError, Result};
use crate::parse::ByteParser;
use crate::registry::types::TypeSettingsRegistry;
use crate::session::Session;
use crate::settings::TypeDenotation;

type EncodeBinFn = fn(&Session<'_>, &dyn Any, &mut Vec<u8>) -> Result<()>;
type EncodeMapFn = fn(&Session<'_>, &dyn Any) -> Result<Value>;
type DecodeBinFn<I> = Arc<dyn Fn(&Session<'_>, &mut ByteParser<'_>) -> Result<Box<I>> + Send + Sync>;
type DecodeMapFn<I> = Arc<dyn Fn(&Session<'_>, &Value) -> Result<Box<I>> + Send + Sync>;

/// Concrete type registered under the interface `I`, with its type-erased codec
/// entry points.
pub struct Implementation<I: ?Sized + 'static> {
    type_id: TypeId,
    type_name: &'static str,
    writes_code: bool,
    encode_bin: EncodeBinFn,
    encode_map: EncodeMapFn,
    decode_bin: DecodeBinFn<I>,
    decode_map: DecodeMapFn<I>,
}

impl<I: ?Sized + 'static> Clone for Implementation<I> {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            writes_code: self.writes_code,
            encode_bin: self.encode_bin,
            encode_map: self.encode_map,
            decode_bin: Arc::clone(&self.decode_bin),
            decode_map: Arc::clone(&self.decode_map),
        }
    }
}

impl<I: ?Sized + 'static> Implementation<I> {
    /// Describes `T` as an implementation of `I`, using `upcast` to produce trait
    /// objects from decoded values.
    ///
    /// ```ignore
    /// Implementation::<dyn Shape>::new::<Circle>(|c| Box::new(c))
    /// ```
    pub fn new<T: Decode>(upcast: fn(T) -> Box<I>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            writes_code: !matches!(T::KIND, Kind::Struct | Kind::Custom),
            encode_bin: encode_bin_erased::<I, T>,
            encode_map: encode_map_erased::<I, T>,
            decode_bin: Arc::new(move |s: &Session<'_>, p: &mut ByteParser<'_>| {
                s.decode_nested::<T>(None, p).map(upcast)
            }),
            decode_map: Arc::new(move |s: &Session<'_>, v: &Value| {
                s.map_decode_nested::<T>(None, v).map(upcast)
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the interface engine writes the object code itself, rather than the
    /// concrete type's own encoding doing so.
    pub(crate) fn writes_code(&self) -> bool {
        self.writes_code
    }

    pub(crate) fn encode_bin(&self, s: &Session<'_>, value: &dyn Any, buf: &mut Vec<u8>) -> Result<()> {
        (self.encode_bin)(s, value, buf)
    }

    pub(crate) fn encode_map(&self, s: &Session<'_>, value: &dyn Any) -> Result<Value> {
        (self.encode_map)(s, value)
    }

    pub(crate) fn decode_bin(&self, s: &Session<'_>, p: &mut ByteParser<'_>) -> Result<Box<I>> {
        (self.decode_bin)(s, p)
    }

    pub(crate) fn decode_map(&self, s: &Session<'_>, v: &Value) -> Result<Box<I>> {
        (self.decode_map)(s, v)
    }
}

fn downcast<I: ?Sized + 'static, T: 'static>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(|| {
        DataError::UnregisteredInterfaceType {
            interface: type_name::<I>(),
            type_name: type_name::<T>(),
        }
        .into()
    })
}

fn encode_bin_erased<I: ?Sized + 'static, T: Encode>(
    s: &Session<'_>,
    value: &dyn Any,
    buf: &mut Vec<u8>,
) -> Result<()> {
    s.encode_nested(downcast::<I, T>(value)?, None, buf)
}

fn encode_map_erased<I: ?Sized + 'static, T: Encode>(s: &Session<'_>, value: &dyn Any) -> Result<Value> {
    s.map_encode_nested(downcast::<I, T>(value)?, None)
}

/// Closed set of concrete types registered under one interface.
pub struct InterfaceObjects<I: ?Sized + 'static> {
    interface: &'static str,
    denotation: Option<TypeDenotation>,
    entries: Vec<(u32, Implementation<I>)>,
    by_code: HashMap<u32, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl<I: ?Sized + 'static> Clone for InterfaceObjects<I> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface,
            denotation: self.denotation,
            entries: self.entries.clone(),
            by_code: self.by_code.clone(),
            by_type: self.by_type.clone(),
        }
    }
}

impl<I: ?Sized + 'static> InterfaceObjects<I> {
    fn empty() -> Self {
        Self {
            interface: type_name::<I>(),
            denotation: None,
            entries: Vec::new(),
            by_code: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }

    /// Width shared by the object codes of every implementation.
    pub fn denotation(&self) -> Option<TypeDenotation> {
        self.denotation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Implementations in registration order, with their object codes.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Implementation<I>)> + '_ {
        self.entries.iter().map(|(code, imp)| (*code, imp))
    }

    pub fn resolve_by_code(&self, code: u32) -> Option<&Implementation<I>> {
        self.by_code.get(&code).map(|&ix| &self.entries[ix].1)
    }

    pub fn resolve_by_type(&self, type_id: TypeId) -> Option<(u32, &Implementation<I>)> {
        self.by_type
            .get(&type_id)
            .map(|&ix| (self.entries[ix].0, &self.entries[ix].1))
    }

    fn push(&mut self, code: u32, denotation: TypeDenotation, imp: Implementation<I>) -> Result<(), ConfigError> {
        match self.denotation {
            Some(expected) if expected != denotation => {
                return Err(ConfigError::InterfaceDenotationMismatch {
                    interface: self.interface,
                    type_name: imp.type_name,
                    expected,
                    actual: denotation,
                })
            }
            _ => self.denotation = Some(denotation),
        }
        if self.by_code.contains_key(&code) {
            return Err(ConfigError::DuplicateObjectCode {
                interface: self.interface,
                code,
            });
        }
        let ix = self.entries.len();
        self.by_code.insert(code, ix);
        self.by_type.insert(imp.type_id, ix);
        self.entries.push((code, imp));
        Ok(())
    }
}

/// Table mapping each interface to its [`InterfaceObjects`].
#[derive(Default)]
pub struct InterfacesRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl InterfacesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `implementations` to the set registered under `I`.
    ///
    /// Object codes are taken from the settings registered for each concrete type.
    /// Nothing is added unless every implementation is accepted.
    pub fn register<I: ?Sized + 'static>(
        &self,
        types: &TypeSettingsRegistry,
        implementations: Vec<Implementation<I>>,
    ) -> Result<(), ConfigError> {
        let mut entries = self.entries.write();
        let mut objects = match entries.get(&TypeId::of::<I>()) {
            Some(existing) => existing
                .downcast_ref::<InterfaceObjects<I>>()
                .cloned()
                .unwrap_or_else(InterfaceObjects::empty),
            None => InterfaceObjects::empty(),
        };
        for imp in implementations {
            let object_type = types
                .resolve_id(imp.type_id)
                .and_then(|ts| ts.object_type())
                .ok_or(ConfigError::MissingObjectType {
                    type_name: imp.type_name,
                })?;
            debug!(
                interface = objects.interface,
                type_name = imp.type_name,
                code = object_type.code,
                "registered interface implementation"
            );
            objects.push(object_type.code, object_type.denotation, imp)?;
        }
        entries.insert(TypeId::of::<I>(), Arc::new(objects));
        Ok(())
    }

    /// Returns the implementations registered under `I`.
    pub fn get<I: ?Sized + 'static>(&self) -> Result<Arc<InterfaceObjects<I>>, ConfigError> {
        let not_registered = || ConfigError::InterfaceNotRegistered {
            interface: type_name::<I>(),
        };
        let erased = self
            .entries
            .read()
            .get(&TypeId::of::<I>())
            .cloned()
            .ok_or_else(not_registered)?;
        erased
            .downcast::<InterfaceObjects<I>>()
            .map_err(|_| not_registered())
    }
}
