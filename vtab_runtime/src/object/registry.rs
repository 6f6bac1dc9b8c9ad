//! Dispatch table registry.
//!
//! Types, slots and capabilities are declared on a [`RegistryBuilder`].
//! [`RegistryBuilder::build`] freezes everything into a [`DispatchRegistry`],
//! which is immutable and safe to share across threads.
//!
//! A registry can be installed once as the process-wide registry with
//! [`install_global`].

use crate::config::RegistryConfig;
use crate::error::DispatchError;
use crate::object::capability::{Capability, CapabilityId};
use crate::object::descriptor::{
    Bases, Lineage, Method, Slot, TypeDescriptor, TypeFlags, TypeId,
};
use crate::object::handle::Handle;
use crate::object::instance::{Fields, Instance};
use crate::object::resolve::{self, Resolved, VTable};
use crate::op::OpId;
use crate::owner::UniqueOwner;
use crate::value::Value;
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace, warn};

// =============================================================================
// Registry Identity
// =============================================================================

/// Identity of one built [`DispatchRegistry`].
///
/// Every instance records the registry that created it, so type ids are
/// never read against another registry's descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u32);

impl RegistryId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(0);

fn allocate_registry_id() -> RegistryId {
    RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// Builder
// =============================================================================

/// Mutable registry used during type setup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
    types: Vec<TypeDescriptor>,
    names: FxHashMap<Arc<str>, TypeId>,
    capabilities: Vec<Capability>,
}

impl RegistryBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with an explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Declare a type deriving from `bases`, in declaration order.
    pub fn define_type(&mut self, name: &str, bases: &[TypeId]) -> Result<TypeId, DispatchError> {
        let name: Arc<str> = Arc::from(name);
        if self.names.contains_key(&name) {
            return Err(DispatchError::DuplicateTypeName(name));
        }
        if bases.len() > self.config.max_direct_bases {
            return Err(DispatchError::TooManyBases {
                type_name: name,
                count: bases.len(),
                limit: self.config.max_direct_bases,
            });
        }

        let mut direct = Bases::new();
        for &base in bases {
            let base_desc = self.descriptor(base)?;
            if base_desc.is_sealed() {
                return Err(DispatchError::SealedBase {
                    base: base_desc.name().clone(),
                });
            }
            if direct.contains(&base) {
                return Err(DispatchError::DuplicateBase {
                    type_name: name,
                    base: base_desc.name().clone(),
                });
            }
            direct.push(base);
        }

        let id = TypeId(self.types.len() as u32);
        let mut lineage: Lineage = smallvec![id];
        for base in &direct {
            for &ancestor in self.types[base.index()].lineage() {
                if !lineage.contains(&ancestor) {
                    lineage.push(ancestor);
                }
            }
        }

        debug!(type_name = %name, id = id.raw(), bases = direct.len(), "defined type");
        self.names.insert(name.clone(), id);
        self.types.push(TypeDescriptor::new(id, name, direct, lineage));
        Ok(id)
    }

    /// Bind `method` to `op` in the own table of `ty`.
    ///
    /// Fails if `ty` already has an own slot for `op`, bound or required.
    /// Use [`register_override`](Self::register_override) to replace one.
    pub fn register(
        &mut self,
        ty: TypeId,
        op: impl Into<OpId>,
        method: Method,
    ) -> Result<(), DispatchError> {
        let op = op.into();
        let desc = self.descriptor_mut(ty)?;
        if !desc.insert_slot(op, Slot::Bound(method)) {
            return Err(DispatchError::DuplicateBinding {
                type_name: desc.name().clone(),
                op,
            });
        }
        trace!(type_name = %desc.name(), %op, "registered binding");
        Ok(())
    }

    /// Bind `method` to `op` on `ty`, replacing any own slot.
    ///
    /// Fails if nothing in the lineage of `ty` has a slot for `op`.
    pub fn register_override(
        &mut self,
        ty: TypeId,
        op: impl Into<OpId>,
        method: Method,
    ) -> Result<(), DispatchError> {
        let op = op.into();
        let desc = self.descriptor(ty)?;
        let declared = desc
            .lineage()
            .iter()
            .any(|t| self.types[t.index()].own_slot(op).is_some());
        if !declared {
            return Err(DispatchError::NothingToOverride {
                type_name: desc.name().clone(),
                op,
            });
        }

        let desc = self.descriptor_mut(ty)?;
        desc.replace_slot(op, Slot::Bound(method));
        trace!(type_name = %desc.name(), %op, "registered override");
        Ok(())
    }

    /// Mark `op` as mandatory for `ty` without providing a body.
    ///
    /// Any type whose final overrider for `op` is this declaration cannot be
    /// instantiated.
    pub fn declare_required(&mut self, ty: TypeId, op: impl Into<OpId>) -> Result<(), DispatchError> {
        let op = op.into();
        let desc = self.descriptor_mut(ty)?;
        if !desc.insert_slot(op, Slot::Required) {
            return Err(DispatchError::DuplicateBinding {
                type_name: desc.name().clone(),
                op,
            });
        }
        trace!(type_name = %desc.name(), %op, "declared required operation");
        Ok(())
    }

    /// Forbid deriving from `ty`.
    pub fn seal(&mut self, ty: TypeId) -> Result<(), DispatchError> {
        self.descriptor_mut(ty)?.add_flags(TypeFlags::SEALED);
        Ok(())
    }

    /// Declare a capability set.
    pub fn define_capability(&mut self, name: &str, ops: &[OpId]) -> CapabilityId {
        let id = CapabilityId(self.capabilities.len() as u32);
        self.capabilities.push(Capability::new(id, Arc::from(name), ops));
        debug!(capability = name, ops = ops.len(), "defined capability");
        id
    }

    /// Declare that `ty` and its descendants provide `cap`.
    pub fn implement(&mut self, ty: TypeId, cap: CapabilityId) -> Result<(), DispatchError> {
        if cap.0 as usize >= self.capabilities.len() {
            return Err(DispatchError::UnknownCapability(cap));
        }
        self.descriptor_mut(ty)?.add_capability(cap);
        Ok(())
    }

    /// Look up a type declared so far.
    pub fn descriptor(&self, ty: TypeId) -> Result<&TypeDescriptor, DispatchError> {
        self.types.get(ty.index()).ok_or(DispatchError::UnknownType(ty))
    }

    fn descriptor_mut(&mut self, ty: TypeId) -> Result<&mut TypeDescriptor, DispatchError> {
        self.types
            .get_mut(ty.index())
            .ok_or(DispatchError::UnknownType(ty))
    }

    /// Freeze the registry.
    ///
    /// Computes type flags, the missing-operation list of every abstract
    /// type, and (with `eager_vtables`) every final-overrider table.
    ///
    /// An operation is missing when any final overrider is a required
    /// declaration, or when a provided capability names it and nothing in
    /// the lineage binds it.
    pub fn build(self) -> DispatchRegistry {
        let Self {
            config,
            mut types,
            names,
            capabilities,
        } = self;

        let tables = config.eager_vtables.then(|| {
            let mut tables: Vec<VTable> = Vec::with_capacity(types.len());
            for i in 0..types.len() {
                let table = resolve::build_vtable(&types, &tables, TypeId(i as u32));
                tables.push(table);
            }
            tables
        });

        let mut missing: Vec<Vec<OpId>> = Vec::with_capacity(types.len());
        let mut flags: Vec<TypeFlags> = Vec::with_capacity(types.len());
        for i in 0..types.len() {
            let ty = TypeId(i as u32);
            let mut type_missing = Vec::new();
            let mut type_flags = TypeFlags::empty();
            let mut ops = resolve::reachable_ops(&types, ty);
            for &t in types[i].lineage() {
                for cap in types[t.index()].own_capabilities() {
                    for &op in capabilities[cap.0 as usize].ops() {
                        if !ops.contains(&op) {
                            ops.push(op);
                        }
                    }
                }
            }

            for op in ops {
                let candidates = match &tables {
                    Some(tables) => tables[i].get(&op).cloned().unwrap_or_default(),
                    None => resolve::final_overriders(&types, ty, op),
                };
                if resolve::is_unimplemented(&types, op, &candidates) {
                    type_missing.push(op);
                    type_flags |= TypeFlags::ABSTRACT;
                } else if candidates.len() > 1 {
                    type_flags |= TypeFlags::HAS_AMBIGUITY;
                    warn!(type_name = %types[i].name(), %op, "operation has several final overriders");
                }
            }
            missing.push(type_missing);
            flags.push(type_flags);
        }
        for (desc, type_flags) in types.iter_mut().zip(flags) {
            desc.add_flags(type_flags);
        }

        let id = allocate_registry_id();
        debug!(
            registry = id.raw(),
            types = types.len(),
            capabilities = capabilities.len(),
            eager = config.eager_vtables,
            "built dispatch registry"
        );

        DispatchRegistry {
            id,
            config,
            types,
            names,
            capabilities,
            tables,
            missing,
        }
    }
}

// =============================================================================
// Frozen Registry
// =============================================================================

/// Immutable dispatch table registry.
///
/// Holds every type descriptor and capability for its whole lifetime.
#[derive(Debug)]
pub struct DispatchRegistry {
    id: RegistryId,
    config: RegistryConfig,
    types: Vec<TypeDescriptor>,
    names: FxHashMap<Arc<str>, TypeId>,
    capabilities: Vec<Capability>,
    /// Final overriders per type, indexed by `TypeId` (eager mode only).
    tables: Option<Vec<VTable>>,
    /// Required operations left unbound, indexed by `TypeId`.
    missing: Vec<Vec<OpId>>,
}

impl DispatchRegistry {
    /// Identity stamped into every instance this registry creates.
    #[inline]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a type descriptor.
    pub fn descriptor(&self, ty: TypeId) -> Result<&TypeDescriptor, DispatchError> {
        self.types.get(ty.index()).ok_or(DispatchError::UnknownType(ty))
    }

    /// Look up a type by name.
    pub fn type_by_name(&self, name: &str) -> Result<TypeId, DispatchError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| DispatchError::UnknownTypeName(Arc::from(name)))
    }

    /// Look up a capability.
    pub fn capability(&self, cap: CapabilityId) -> Result<&Capability, DispatchError> {
        self.capabilities
            .get(cap.0 as usize)
            .ok_or(DispatchError::UnknownCapability(cap))
    }

    /// The type and all its ancestors, each once.
    pub fn lineage(&self, ty: TypeId) -> Result<&[TypeId], DispatchError> {
        Ok(self.descriptor(ty)?.lineage())
    }

    /// Whether `derived` is `base` or descends from it.
    pub fn is_subtype(&self, derived: TypeId, base: TypeId) -> bool {
        self.descriptor(derived)
            .is_ok_and(|desc| desc.derives_from(base))
    }

    /// Whether `ty` or one of its ancestors declares `cap`.
    pub fn provides(&self, ty: TypeId, cap: CapabilityId) -> bool {
        self.descriptor(ty).is_ok_and(|desc| {
            desc.lineage()
                .iter()
                .any(|t| self.types[t.index()].own_capabilities().contains(&cap))
        })
    }

    /// Required operations that keep `ty` from being instantiated.
    pub fn missing_ops(&self, ty: TypeId) -> Result<&[OpId], DispatchError> {
        self.descriptor(ty)?;
        Ok(&self.missing[ty.index()])
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `op` for the type of `instance`.
    ///
    /// Fails with `ForeignInstance` if another registry created `instance`.
    #[inline]
    pub fn resolve(
        &self,
        instance: &Instance,
        op: impl Into<OpId>,
    ) -> Result<Resolved<'_>, DispatchError> {
        self.check_owner(instance)?;
        self.resolve_type(instance.type_id(), op)
    }

    fn check_owner(&self, instance: &Instance) -> Result<(), DispatchError> {
        if instance.registry_id() == self.id {
            return Ok(());
        }
        Err(DispatchError::ForeignInstance {
            type_id: instance.type_id(),
            owner: instance.registry_id(),
            registry: self.id,
        })
    }

    /// Resolve `op` for `ty` to its most-derived implementation.
    pub fn resolve_type(
        &self,
        ty: TypeId,
        op: impl Into<OpId>,
    ) -> Result<Resolved<'_>, DispatchError> {
        let op = op.into();
        self.descriptor(ty)?;

        let result = match &self.tables {
            Some(tables) => {
                let candidates = tables[ty.index()].get(&op).map_or(&[][..], |c| c.as_slice());
                resolve::classify(&self.types, ty, op, candidates)
            }
            None => {
                let candidates = resolve::final_overriders(&self.types, ty, op);
                resolve::classify(&self.types, ty, op, &candidates)
            }
        };

        match &result {
            Ok(resolved) => trace!(ty = ty.raw(), %op, defining_type = resolved.defining_type.raw(), "resolved"),
            Err(e) => trace!(ty = ty.raw(), %op, error = %e, "resolution failed"),
        }
        result
    }

    /// Resolve `op` on `instance` and invoke it.
    pub fn call(
        &self,
        instance: &Instance,
        op: impl Into<OpId>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let resolved = self.resolve(instance, op)?;
        Ok((resolved.method)(instance, args))
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create an instance of `ty`.
    ///
    /// Fails if `ty` has any missing operation (see [`RegistryBuilder::build`]).
    pub fn instantiate(&self, ty: TypeId, fields: Fields) -> Result<Instance, DispatchError> {
        let desc = self.descriptor(ty)?;
        let missing = &self.missing[ty.index()];
        if !missing.is_empty() {
            return Err(DispatchError::AbstractInstantiation {
                type_name: desc.name().clone(),
                missing: missing.clone(),
            });
        }
        Ok(Instance::new(self.id, ty, fields))
    }

    /// Create an instance of `ty` on the heap, owned by a [`UniqueOwner`].
    pub fn construct(
        &self,
        ty: TypeId,
        fields: Fields,
    ) -> Result<UniqueOwner<Instance>, DispatchError> {
        self.instantiate(ty, fields).map(UniqueOwner::new)
    }

    /// View `instance` through `cap`.
    ///
    /// Fails if another registry created `instance`, or if the instance's
    /// type does not provide the capability.
    pub fn handle<'a>(
        &'a self,
        instance: &'a Instance,
        cap: CapabilityId,
    ) -> Result<Handle<'a>, DispatchError> {
        self.check_owner(instance)?;
        let capability = self.capability(cap)?;
        let ty = instance.type_id();
        if !self.provides(ty, cap) {
            return Err(DispatchError::MissingCapability {
                type_name: self.descriptor(ty)?.name().clone(),
                capability: capability.name().clone(),
            });
        }
        Ok(Handle::new(self, instance, capability))
    }
}

// =============================================================================
// Global Registry Access
// =============================================================================

/// Global dispatch registry singleton.
static GLOBAL_REGISTRY: OnceLock<DispatchRegistry> = OnceLock::new();

/// Install `registry` as the process-wide registry.
///
/// This should be called once at startup, after every type is declared.
pub fn install_global(registry: DispatchRegistry) -> Result<&'static DispatchRegistry, DispatchError> {
    let types = registry.len();
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| DispatchError::GlobalAlreadyInstalled)?;
    debug!(types, "installed global dispatch registry");
    GLOBAL_REGISTRY.get().ok_or(DispatchError::GlobalAlreadyInstalled)
}

/// The process-wide registry, if one has been installed.
pub fn global_registry() -> Option<&'static DispatchRegistry> {
    GLOBAL_REGISTRY.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AmbiguityKind;
    use crate::object::descriptor::method;
    use crate::object::instance::fields;

    fn text(s: &'static str) -> Method {
        method(move |_, _| Value::str(s))
    }

    #[test]
    fn test_registry_creation() {
        let registry = RegistryBuilder::new().build();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_type_ids_are_sequential() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        let c = b.define_type("C", &[a]).unwrap();
        assert_eq!(a.raw(), 0);
        assert_eq!(c.raw(), 1);
    }

    #[test]
    fn test_duplicate_type_name_rejected() {
        let mut b = RegistryBuilder::new();
        b.define_type("A", &[]).unwrap();
        assert!(matches!(
            b.define_type("A", &[]),
            Err(DispatchError::DuplicateTypeName(_))
        ));
    }

    #[test]
    fn test_unknown_base_rejected() {
        let mut b = RegistryBuilder::new();
        assert!(matches!(
            b.define_type("A", &[TypeId(7)]),
            Err(DispatchError::UnknownType(TypeId(7)))
        ));
    }

    #[test]
    fn test_duplicate_base_rejected() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        assert!(matches!(
            b.define_type("B", &[a, a]),
            Err(DispatchError::DuplicateBase { .. })
        ));
    }

    #[test]
    fn test_too_many_bases_rejected() {
        let mut b = RegistryBuilder::with_config(RegistryConfig {
            max_direct_bases: 1,
            ..Default::default()
        });
        let x = b.define_type("X", &[]).unwrap();
        let y = b.define_type("Y", &[]).unwrap();
        assert!(matches!(
            b.define_type("Z", &[x, y]),
            Err(DispatchError::TooManyBases { count: 2, limit: 1, .. })
        ));
    }

    #[test]
    fn test_sealed_base_rejected() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        b.seal(a).unwrap();
        assert!(matches!(
            b.define_type("B", &[a]),
            Err(DispatchError::SealedBase { .. })
        ));
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut b = RegistryBuilder::new();
        let cat = b.define_type("Cat", &[]).unwrap();
        b.register(cat, "speak", text("Meow")).unwrap();
        let err = b.register(cat, "speak", text("Purr")).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateBinding { .. }));
        assert_eq!(err.to_string(), "operation `speak` is already bound on type `Cat`");
    }

    #[test]
    fn test_required_then_register_is_duplicate() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        b.declare_required(a, "speak").unwrap();
        assert!(matches!(
            b.register(a, "speak", text("?")),
            Err(DispatchError::DuplicateBinding { .. })
        ));
        assert!(matches!(
            b.declare_required(a, "speak"),
            Err(DispatchError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn test_override_replaces_own_binding() {
        let mut b = RegistryBuilder::new();
        let cat = b.define_type("Cat", &[]).unwrap();
        b.register(cat, "speak", text("Meow")).unwrap();
        b.register_override(cat, "speak", text("Purr")).unwrap();
        let registry = b.build();

        let tom = registry.instantiate(cat, Fields::default()).unwrap();
        assert_eq!(registry.call(&tom, "speak", &[]).unwrap(), Value::str("Purr"));
    }

    #[test]
    fn test_override_needs_declaration() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        assert!(matches!(
            b.register_override(a, "speak", text("?")),
            Err(DispatchError::NothingToOverride { .. })
        ));
    }

    #[test]
    fn test_override_of_inherited_required() {
        let mut b = RegistryBuilder::new();
        let animal = b.define_type("Animal", &[]).unwrap();
        b.declare_required(animal, "speak").unwrap();
        let dog = b.define_type("Dog", &[animal]).unwrap();
        b.register_override(dog, "speak", text("Woof")).unwrap();
        let registry = b.build();

        let rex = registry.instantiate(dog, Fields::default()).unwrap();
        assert_eq!(registry.call(&rex, "speak", &[]).unwrap(), Value::str("Woof"));
    }

    #[test]
    fn test_abstract_flag_and_missing_ops() {
        let mut b = RegistryBuilder::new();
        let animal = b.define_type("Animal", &[]).unwrap();
        b.declare_required(animal, "speak").unwrap();
        b.declare_required(animal, "eat").unwrap();
        let cat = b.define_type("Cat", &[animal]).unwrap();
        b.register(cat, "speak", text("Meow")).unwrap();
        let registry = b.build();

        assert!(registry.descriptor(animal).unwrap().is_abstract());
        assert!(registry.descriptor(cat).unwrap().is_abstract());
        assert_eq!(registry.missing_ops(cat).unwrap(), &[OpId::intern("eat")]);
        assert_eq!(registry.missing_ops(animal).unwrap().len(), 2);
    }

    #[test]
    fn test_lazy_resolution() {
        let mut b = RegistryBuilder::with_config(RegistryConfig {
            eager_vtables: false,
            ..Default::default()
        });
        let base = b.define_type("Base", &[]).unwrap();
        b.register(base, "describe", text("base")).unwrap();
        let derived = b.define_type("Derived", &[base]).unwrap();
        let registry = b.build();

        let resolved = registry.resolve_type(derived, "describe").unwrap();
        assert_eq!(resolved.defining_type, base);
    }

    #[test]
    fn test_ambiguity_flag() {
        let mut b = RegistryBuilder::new();
        let x = b.define_type("X", &[]).unwrap();
        let y = b.define_type("Y", &[]).unwrap();
        b.register(x, "id", text("x")).unwrap();
        b.register(y, "id", text("y")).unwrap();
        let z = b.define_type("Z", &[x, y]).unwrap();
        let registry = b.build();

        assert!(registry.descriptor(z).unwrap().flags().contains(TypeFlags::HAS_AMBIGUITY));
        assert!(matches!(
            registry.resolve_type(z, "id"),
            Err(DispatchError::AmbiguousOperation {
                kind: AmbiguityKind::UnrelatedBases,
                ..
            })
        ));
    }

    #[test]
    fn test_subtype_and_lineage() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        let l = b.define_type("L", &[a]).unwrap();
        let r = b.define_type("R", &[a]).unwrap();
        let d = b.define_type("D", &[l, r]).unwrap();
        let registry = b.build();

        assert_eq!(registry.lineage(d).unwrap(), &[d, l, a, r]);
        assert!(registry.is_subtype(d, a));
        assert!(registry.is_subtype(d, d));
        assert!(!registry.is_subtype(l, r));
        assert!(!registry.is_subtype(TypeId(99), a));
        assert_eq!(registry.type_by_name("R").unwrap(), r);
        assert!(registry.type_by_name("Q").is_err());
    }

    #[test]
    fn test_capability_inherited() {
        let mut b = RegistryBuilder::new();
        let speak = OpId::intern("speak");
        let pet = b.define_capability("Pet", &[speak]);
        let animal = b.define_type("Animal", &[]).unwrap();
        b.implement(animal, pet).unwrap();
        let cat = b.define_type("Cat", &[animal]).unwrap();
        let rock = b.define_type("Rock", &[]).unwrap();
        let registry = b.build();

        assert!(registry.provides(cat, pet));
        assert!(!registry.provides(rock, pet));
    }

    #[test]
    fn test_implement_unknown_capability() {
        let mut b = RegistryBuilder::new();
        let a = b.define_type("A", &[]).unwrap();
        assert!(matches!(
            b.implement(a, CapabilityId(3)),
            Err(DispatchError::UnknownCapability(_))
        ));
    }

    #[test]
    fn test_instantiate_keeps_fields() {
        let mut b = RegistryBuilder::new();
        let cat = b.define_type("Cat", &[]).unwrap();
        let registry = b.build();
        let tom = registry.instantiate(cat, fields([("lives", 9i64)])).unwrap();
        assert_eq!(tom.type_id(), cat);
        assert_eq!(tom.get("lives"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_capability_without_binding_is_abstract() {
        let mut b = RegistryBuilder::new();
        let speak = OpId::intern("registry_test_unbound_speak");
        let pet = b.define_capability("Pet", &[speak]);
        let rock = b.define_type("Rock", &[]).unwrap();
        b.implement(rock, pet).unwrap();
        let pebble = b.define_type("Pebble", &[rock]).unwrap();
        let registry = b.build();

        for ty in [rock, pebble] {
            assert!(registry.descriptor(ty).unwrap().is_abstract());
            assert_eq!(registry.missing_ops(ty).unwrap(), &[speak]);
        }
    }

    #[test]
    fn test_registry_ids_are_distinct() {
        let first = RegistryBuilder::new().build();
        let second = RegistryBuilder::new().build();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_instance_rejected_by_other_registry() {
        let build = || {
            let mut b = RegistryBuilder::new();
            let cat = b.define_type("Cat", &[]).unwrap();
            b.register(cat, "speak", text("Meow")).unwrap();
            (b.build(), cat)
        };
        let (home, cat) = build();
        let (other, _) = build();
        let tom = home.instantiate(cat, Fields::default()).unwrap();
        assert_eq!(tom.registry_id(), home.id());

        match other.call(&tom, "speak", &[]) {
            Err(DispatchError::ForeignInstance { owner, registry, .. }) => {
                assert_eq!(owner, home.id());
                assert_eq!(registry, other.id());
            }
            result => panic!("expected foreign instance error, got {result:?}"),
        }
        assert_eq!(home.call(&tom, "speak", &[]).unwrap(), Value::str("Meow"));
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchRegistry>();
    }
}
