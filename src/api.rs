//! Public entry points
//!
//! An [`Api`] bundles the registries consulted by the engines with the field cache.
//! Most programs build one during start-up, register their types and interfaces on
//! it, and share it by reference afterwards; [`default_api`] offers a process-wide
//! instance for programs that prefer a singleton.

use std::any::Any;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::context::Context;
use crate::conv::{Decode, Encode, Struct};
use crate::error::{BoxError, Result};
use crate::field::{FieldCache, FieldDescriptor};
use crate::parse::ByteParser;
use crate::registry::{Implementation, InterfacesRegistry, TypeSettingsRegistry, ValidatorsRegistry};
use crate::session::Session;
use crate::settings::TypeSettings;

/// Per-call options.
#[derive(Clone, Debug, Default)]
pub struct Options {
    validation: bool,
    type_settings: Option<TypeSettings>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables validators and array rules for the call.
    #[must_use]
    pub fn with_validation(mut self) -> Self {
        self.validation = true;
        self
    }

    /// Overrides the settings of the top-level value, taking precedence over the
    /// settings registered for its type.
    #[must_use]
    pub fn with_type_settings(mut self, settings: TypeSettings) -> Self {
        self.type_settings = Some(settings);
        self
    }

    pub fn validation(&self) -> bool {
        self.validation
    }

    pub fn type_settings(&self) -> Option<&TypeSettings> {
        self.type_settings.as_ref()
    }
}

/// Registries and field cache shared by every call.
#[derive(Default)]
pub struct Api {
    types: TypeSettingsRegistry,
    interfaces: InterfacesRegistry,
    validators: ValidatorsRegistry,
    fields: FieldCache,
}

impl Api {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the default settings of `T`.
    pub fn register_type_settings<T: Encode>(&self, settings: TypeSettings) -> Result<()> {
        Ok(self.types.register::<T>(settings)?)
    }

    /// Registers concrete implementations of the interface `I`.
    ///
    /// The settings of every implementation, including its object type, must have
    /// been registered beforehand.
    pub fn register_interface<I: ?Sized + 'static>(
        &self,
        implementations: Vec<Implementation<I>>,
    ) -> Result<()> {
        Ok(self.interfaces.register::<I>(&self.types, implementations)?)
    }

    pub fn register_syntactic_validator<T, F>(&self, validator: F) -> Result<()>
    where
        T: Any,
        F: Fn(&Context, &T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Ok(self.validators.register_syntactic::<T, F>(validator)?)
    }

    /// Registers a validator over the serialized bytes of `T`.
    ///
    /// On encode the validator receives exactly the bytes written for the value. On
    /// decode it runs before the value is read, so the slice starts at the value but
    /// extends to the end of the input, sibling fields and trailing bytes included.
    /// Validators should only inspect the prefix they expect.
    pub fn register_bytes_validator<T, F>(&self, validator: F) -> Result<()>
    where
        T: Any,
        F: Fn(&Context, &[u8]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Ok(self.validators.register_bytes::<T, F>(validator)?)
    }

    pub fn type_settings(&self) -> &TypeSettingsRegistry {
        &self.types
    }

    pub fn interfaces(&self) -> &InterfacesRegistry {
        &self.interfaces
    }

    pub fn validators(&self) -> &ValidatorsRegistry {
        &self.validators
    }

    /// Parsed field table of the struct `T`.
    pub fn fields<T: Struct>(&self) -> Result<Arc<[FieldDescriptor]>> {
        Ok(self.fields.fields::<T>()?)
    }

    /// Serializes `value` to the binary wire format.
    pub fn encode<T: Encode>(&self, ctx: &Context, value: &T, opts: &Options) -> Result<Vec<u8>> {
        let s = Session::new(self, ctx, opts);
        let mut buf = Vec::new();
        s.encode_nested(value, opts.type_settings(), &mut buf)?;
        Ok(buf)
    }

    /// Deserializes `bytes` into `target`, returning the number of bytes consumed.
    ///
    /// `target` is left untouched when decoding fails.
    pub fn decode<T: Decode>(
        &self,
        ctx: &Context,
        bytes: &[u8],
        target: &mut T,
        opts: &Options,
    ) -> Result<usize> {
        let (value, consumed) = self.decode_value::<T>(ctx, bytes, opts)?;
        *target = value;
        Ok(consumed)
    }

    /// Deserializes a `T` from the start of `bytes`, together with the number of bytes consumed.
    pub fn decode_value<T: Decode>(
        &self,
        ctx: &Context,
        bytes: &[u8],
        opts: &Options,
    ) -> Result<(T, usize)> {
        let s = Session::new(self, ctx, opts);
        let mut p = ByteParser::new(bytes);
        let value = s.decode_nested::<T>(opts.type_settings(), &mut p)?;
        cfg_if::cfg_if! {
            if #[cfg(feature = "check_complete_parse")] {
                if p.remainder() != 0 {
                    return Err(crate::error::DataError::TrailingBytes {
                        remaining: p.remainder(),
                    }
                    .into());
                }
            }
        }
        Ok((value, p.offset()))
    }

    /// Converts `value` to its ordered map representation.
    pub fn map_encode<T: Encode>(&self, ctx: &Context, value: &T, opts: &Options) -> Result<Value> {
        let s = Session::new(self, ctx, opts);
        s.map_encode_nested(value, opts.type_settings())
    }

    /// Interprets the map representation `value` into `target`.
    pub fn map_decode<T: Decode>(
        &self,
        ctx: &Context,
        value: &Value,
        target: &mut T,
        opts: &Options,
    ) -> Result<()> {
        let s = Session::new(self, ctx, opts);
        *target = s.map_decode_nested::<T>(opts.type_settings(), value)?;
        Ok(())
    }

    /// Renders the map representation of `value` as JSON text.
    pub fn json_encode<T: Encode>(&self, ctx: &Context, value: &T, opts: &Options) -> Result<String> {
        let map = self.map_encode(ctx, value, opts)?;
        Ok(serde_json::to_string(&map)?)
    }

    /// Parses JSON text and interprets it into `target`.
    pub fn json_decode<T: Decode>(
        &self,
        ctx: &Context,
        json: &str,
        target: &mut T,
        opts: &Options,
    ) -> Result<()> {
        let value: Value = serde_json::from_str(json)?;
        self.map_decode(ctx, &value, target, opts)
    }
}

lazy_static! {
    static ref DEFAULT_API: Api = Api::new();
}

/// Process-wide [`Api`], created on first use.
pub fn default_api() -> &'static Api {
    &DEFAULT_API
}
