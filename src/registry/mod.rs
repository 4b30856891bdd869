//! Registries consulted by the engines
//!
//! Each registry is filled during start-up and read on every call afterwards;
//! lookups hold a read lock only for as long as the lookup itself, never across a
//! recursive encode or decode.

pub mod interfaces;
pub mod types;
pub mod validators;

pub use interfaces::{Implementation, InterfaceObjects, InterfacesRegistry};
pub use types::TypeSettingsRegistry;
pub use validators::ValidatorsRegistry;
