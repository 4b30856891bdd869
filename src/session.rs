//! Per-call traversal state
//!
//! A [`Session`] is created by each public entry point of [`Api`] and threaded
//! through the whole recursive traversal. Every nested value passes through one of
//! its `*_value` methods, which is where the validation pipeline runs:
//!
//!   * encode: syntactic validator on the value, then the bytes validator on the
//!     freshly produced bytes;
//!   * decode: bytes validator on the remaining input, then the syntactic validator
//!     on the freshly built value.

use serde_json::Value;

use crate::api::{Api, Options};
use crate::context::Context;
use crate::conv::{Decode, Encode};
use crate::error::Result;
use crate::parse::ByteParser;
use crate::settings::TypeSettings;

pub struct Session<'a> {
    api: &'a Api,
    ctx: &'a Context,
    validation: bool,
}

impl<'a> Session<'a> {
    pub(crate) fn new(api: &'a Api, ctx: &'a Context, opts: &Options) -> Self {
        Self {
            api,
            ctx,
            validation: opts.validation(),
        }
    }

    #[inline]
    pub fn api(&self) -> &'a Api {
        self.api
    }

    #[inline]
    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    /// Whether validators and array rules are being enforced.
    #[inline]
    pub fn validation(&self) -> bool {
        self.validation
    }

    /// Merges `over` with the registered settings of `T`, `over` taking precedence.
    pub fn settings_for<T: Encode>(&self, over: Option<&TypeSettings>) -> TypeSettings {
        let registered = self.api.type_settings().resolve::<T>();
        match (over, registered) {
            (Some(over), Some(registered)) => over.merge(&registered),
            (Some(over), None) => over.clone(),
            (None, Some(registered)) => registered,
            (None, None) => TypeSettings::default(),
        }
    }

    /// Encodes `value` with already-merged settings.
    pub fn encode_value<T: Encode>(
        &self,
        value: &T,
        ts: &TypeSettings,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        if self.validation {
            self.api.validators().run_syntactic(self.ctx, value)?;
        }
        let start = buf.len();
        value.encode_bin(self, ts, buf)?;
        if self.validation {
            self.api.validators().run_bytes::<T>(self.ctx, &buf[start..])?;
        }
        Ok(())
    }

    /// Resolves the settings of `T` under the field override `over`, then encodes `value`.
    pub fn encode_nested<T: Encode>(
        &self,
        value: &T,
        over: Option<&TypeSettings>,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        let ts = self.settings_for::<T>(over);
        self.encode_value(value, &ts, buf)
    }

    /// Decodes a `T` with already-merged settings.
    pub fn decode_value<T: Decode>(&self, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<T> {
        if self.validation {
            self.api.validators().run_bytes::<T>(self.ctx, p.rest())?;
        }
        let value = T::decode_bin(self, ts, p)?;
        if self.validation {
            self.api.validators().run_syntactic(self.ctx, &value)?;
        }
        Ok(value)
    }

    pub fn decode_nested<T: Decode>(
        &self,
        over: Option<&TypeSettings>,
        p: &mut ByteParser<'_>,
    ) -> Result<T> {
        let ts = self.settings_for::<T>(over);
        self.decode_value(&ts, p)
    }

    /// Produces the map representation of `value` with already-merged settings.
    pub fn map_encode_value<T: Encode>(&self, value: &T, ts: &TypeSettings) -> Result<Value> {
        if self.validation {
            self.api.validators().run_syntactic(self.ctx, value)?;
        }
        value.encode_map(self, ts)
    }

    pub fn map_encode_nested<T: Encode>(
        &self,
        value: &T,
        over: Option<&TypeSettings>,
    ) -> Result<Value> {
        let ts = self.settings_for::<T>(over);
        self.map_encode_value(value, &ts)
    }

    /// Interprets a `T` from its map representation with already-merged settings.
    pub fn map_decode_value<T: Decode>(&self, ts: &TypeSettings, v: &Value) -> Result<T> {
        let value = T::decode_map(self, ts, v)?;
        if self.validation {
            self.api.validators().run_syntactic(self.ctx, &value)?;
        }
        Ok(value)
    }

    pub fn map_decode_nested<T: Decode>(&self, over: Option<&TypeSettings>, v: &Value) -> Result<T> {
        let ts = self.settings_for::<T>(over);
        self.map_decode_value(&ts, v)
    }
}
