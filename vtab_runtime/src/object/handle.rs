//! Non-owning polymorphic handles.
//!
//! A `Handle` views an [`Instance`] through one capability set. Calls made
//! through it are dispatched by the registry to the most-derived
//! implementation without the caller naming the concrete type.
//!
//! The handle borrows both the registry and the instance, so it cannot
//! outlive the owner it was taken from.

use crate::error::DispatchError;
use crate::object::capability::{Capability, CapabilityId};
use crate::object::descriptor::TypeId;
use crate::object::instance::Instance;
use crate::object::registry::DispatchRegistry;
use crate::op::OpId;
use crate::value::Value;

/// Polymorphic view of an instance, typed by a capability.
#[derive(Debug, Clone, Copy)]
pub struct Handle<'a> {
    registry: &'a DispatchRegistry,
    instance: &'a Instance,
    capability: &'a Capability,
}

impl<'a> Handle<'a> {
    pub(crate) fn new(
        registry: &'a DispatchRegistry,
        instance: &'a Instance,
        capability: &'a Capability,
    ) -> Self {
        Self {
            registry,
            instance,
            capability,
        }
    }

    #[inline]
    pub fn capability(&self) -> &'a Capability {
        self.capability
    }

    #[inline]
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Concrete type of the viewed instance.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.instance.type_id()
    }

    /// Whether the viewed instance is `ty` or descends from it.
    #[inline]
    pub fn is_instance_of(&self, ty: TypeId) -> bool {
        self.registry.is_subtype(self.instance.type_id(), ty)
    }

    /// Invoke `op` on the viewed instance.
    ///
    /// `op` must belong to the handle's capability.
    pub fn call(&self, op: impl Into<OpId>, args: &[Value]) -> Result<Value, DispatchError> {
        let op = op.into();
        if !self.capability.contains(op) {
            return Err(DispatchError::NotInCapability {
                capability: self.capability.name().clone(),
                op,
            });
        }
        self.registry.call(self.instance, op, args)
    }

    /// Re-view the same instance through another capability.
    pub fn view_as(&self, cap: CapabilityId) -> Result<Handle<'a>, DispatchError> {
        self.registry.handle(self.instance, cap)
    }
}
