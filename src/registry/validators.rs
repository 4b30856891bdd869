use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{BoxError, ConfigError, Error, Result};

type SyntacticFn = Arc<dyn Fn(&Context, &dyn Any) -> std::result::Result<(), BoxError> + Send + Sync>;
type BytesFn = Arc<dyn Fn(&Context, &[u8]) -> std::result::Result<(), BoxError> + Send + Sync>;

#[derive(Clone, Default)]
struct ValidatorEntry {
    syntactic: Option<SyntacticFn>,
    bytes: Option<BytesFn>,
}

/// Per-type validation hooks, consulted only when a call enables validation.
#[derive(Default)]
pub struct ValidatorsRegistry {
    entries: RwLock<HashMap<TypeId, ValidatorEntry>>,
}

impl ValidatorsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check run on values of `T` before they are encoded and after
    /// they are decoded.
    pub fn register_syntactic<T, F>(&self, validator: F) -> Result<(), ConfigError>
    where
        T: Any,
        F: Fn(&Context, &T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let erased: SyntacticFn = Arc::new(move |ctx: &Context, value: &dyn Any| match value.downcast_ref::<T>() {
            Some(value) => validator(ctx, value),
            None => Ok(()),
        });
        let mut entries = self.entries.write();
        let entry = entries.entry(TypeId::of::<T>()).or_default();
        if entry.syntactic.is_some() {
            return Err(ConfigError::ValidatorAlreadyRegistered {
                type_name: type_name::<T>(),
                hook: "syntactic",
            });
        }
        entry.syntactic = Some(erased);
        debug!(type_name = type_name::<T>(), "registered syntactic validator");
        Ok(())
    }

    /// Registers a check run on the bytes produced by encoding a `T`, and on the
    /// input remaining before a `T` is decoded.
    pub fn register_bytes<T, F>(&self, validator: F) -> Result<(), ConfigError>
    where
        T: Any,
        F: Fn(&Context, &[u8]) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let mut entries = self.entries.write();
        let entry = entries.entry(TypeId::of::<T>()).or_default();
        if entry.bytes.is_some() {
            return Err(ConfigError::ValidatorAlreadyRegistered {
                type_name: type_name::<T>(),
                hook: "bytes",
            });
        }
        entry.bytes = Some(Arc::new(validator));
        debug!(type_name = type_name::<T>(), "registered bytes validator");
        Ok(())
    }

    pub(crate) fn run_syntactic<T: Any>(&self, ctx: &Context, value: &T) -> Result<()> {
        let hook = match self.entries.read().get(&TypeId::of::<T>()) {
            Some(entry) => entry.syntactic.clone(),
            None => return Ok(()),
        };
        match hook {
            Some(hook) => {
                trace!(type_name = type_name::<T>(), "running syntactic validator");
                hook(ctx, value).map_err(Error::validation)
            }
            None => Ok(()),
        }
    }

    pub(crate) fn run_bytes<T: Any>(&self, ctx: &Context, bytes: &[u8]) -> Result<()> {
        let hook = match self.entries.read().get(&TypeId::of::<T>()) {
            Some(entry) => entry.bytes.clone(),
            None => return Ok(()),
        };
        match hook {
            Some(hook) => {
                trace!(type_name = type_name::<T>(), len = bytes.len(), "running bytes validator");
                hook(ctx, bytes).map_err(Error::validation)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hooks_run_per_type() {
        let reg = ValidatorsRegistry::new();
        reg.register_syntactic::<u32, _>(|_, v| {
            if *v > 10 {
                Err(format!("{v} is too large").into())
            } else {
                Ok(())
            }
        })
        .unwrap();
        reg.register_bytes::<u32, _>(|_, b| {
            if b.is_empty() {
                Err("no bytes".into())
            } else {
                Ok(())
            }
        })
        .unwrap();
        let ctx = Context::new();
        assert!(reg.run_syntactic(&ctx, &3u32).is_ok());
        assert!(matches!(
            reg.run_syntactic(&ctx, &11u32),
            Err(Error::Validation(_))
        ));
        assert!(reg.run_syntactic(&ctx, &11u64).is_ok());
        assert!(reg.run_bytes::<u32>(&ctx, &[]).is_err());
        assert!(reg.run_bytes::<u16>(&ctx, &[]).is_ok());
    }

    #[test]
    fn second_registration_fails() {
        let reg = ValidatorsRegistry::new();
        reg.register_bytes::<u8, _>(|_, _| Ok(())).unwrap();
        assert_eq!(
            reg.register_bytes::<u8, _>(|_, _| Ok(())),
            Err(ConfigError::ValidatorAlreadyRegistered {
                type_name: "u8",
                hook: "bytes"
            })
        );
        assert!(reg.register_syntactic::<u8, _>(|_, _| Ok(())).is_ok());
    }
}
