use std::any::{type_name, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::conv::Encode;
use crate::error::ConfigError;
use crate::settings::TypeSettings;

/// Table of default [`TypeSettings`], one canonical entry per concrete type.
#[derive(Default)]
pub struct TypeSettingsRegistry {
    entries: RwLock<HashMap<TypeId, TypeSettings>>,
}

impl TypeSettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the default settings of `T`.
    ///
    /// # Errors
    ///
    /// Fails if `T` already has settings, or if the configured object code does not
    /// fit its denotation.
    pub fn register<T: Encode>(&self, settings: TypeSettings) -> Result<(), ConfigError> {
        let name = type_name::<T>();
        if let Some(object_type) = settings.object_type() {
            object_type.check_range(name)?;
        }
        match self.entries.write().entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(ConfigError::TypeAlreadyRegistered { type_name: name }),
            Entry::Vacant(slot) => {
                debug!(type_name = name, ?settings, "registered type settings");
                slot.insert(settings);
                Ok(())
            }
        }
    }

    /// Looks up the settings of `T`, falling back to the pointee's settings when `T`
    /// is a pointer kind.
    pub fn resolve<T: Encode>(&self) -> Option<TypeSettings> {
        let entries = self.entries.read();
        entries
            .get(&TypeId::of::<T>())
            .or_else(|| T::pointee().and_then(|(id, _)| entries.get(&id)))
            .cloned()
    }

    /// Looks up the settings registered for exactly the type `id`.
    pub fn resolve_id(&self, id: TypeId) -> Option<TypeSettings> {
        self.entries.read().get(&id).cloned()
    }
}
