//! Instance objects.
//!
//! An `Instance` is one runtime object: the id of its type, the registry
//! that created it, and its own fields. Both ids are fixed when the
//! instance is created and there is no way to change them afterwards.
//! Instances are not `Clone`; a second object needs a second
//! `instantiate`.
//!
//! Instances are only created through
//! [`DispatchRegistry::instantiate`](crate::object::registry::DispatchRegistry::instantiate),
//! which rejects abstract types.

use crate::object::descriptor::TypeId;
use crate::object::registry::RegistryId;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Instance field storage.
pub type Fields = FxHashMap<Arc<str>, Value>;

/// A runtime object.
///
/// ```compile_fail
/// fn duplicate(instance: &vtab_runtime::Instance) -> vtab_runtime::Instance {
///     instance.clone()
/// }
/// ```
#[derive(Debug)]
pub struct Instance {
    registry: RegistryId,
    type_id: TypeId,
    fields: Fields,
}

impl Instance {
    pub(crate) fn new(registry: RegistryId, type_id: TypeId, fields: Fields) -> Self {
        Self {
            registry,
            type_id,
            fields,
        }
    }

    /// Registry that created the instance.
    #[inline]
    pub fn registry_id(&self) -> RegistryId {
        self.registry
    }

    /// The instance's type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Get a field.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field, returning the previous value.
    #[inline]
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.fields.insert(Arc::from(name), value)
    }

    /// Remove a field.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field names, in no particular order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| &**k)
    }
}

/// Build a field map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into()))
        .collect()
}
