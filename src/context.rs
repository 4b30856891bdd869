//! Call-scoped context passed to validators and self-describing codecs

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Typed bag of values supplied by the caller of an encode or decode operation.
///
/// The engine itself never reads from the context; it is handed through to
/// validators, [`SelfCodec`](crate::custom::SelfCodec) implementations and
/// [`ContextAware`] types.
#[derive(Clone, Default)]
pub struct Context {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `value` stored under its type.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .finish()
    }
}

/// Types that want to capture the call context once they have been decoded.
///
/// Opt in with `#[serix(context)]` on a struct deriving `Decode`.
pub trait ContextAware {
    fn set_context(&mut self, ctx: &Context);
}
