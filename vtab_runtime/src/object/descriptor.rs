//! Type descriptors.
//!
//! A `TypeDescriptor` is one concrete type's own dispatch table plus its
//! ancestor links. It contains:
//! - The type name
//! - Direct bases (declaration order)
//! - Lineage (the type and all ancestors, deduplicated by identity)
//! - Own slots (operation-id → implementation or required marker)
//! - Declared capabilities
//!
//! # Architecture
//!
//! ```text
//! TypeDescriptor
//! ├── id: TypeId (index into the owning registry)
//! ├── name: Arc<str>
//! ├── bases: SmallVec<TypeId; 2>
//! ├── lineage: SmallVec<TypeId; 8> (self first)
//! ├── slots: Vec<(OpId, Slot)> (registration order)
//! ├── slot_index: FxHashMap<OpId, usize>
//! ├── capabilities: SmallVec<CapabilityId; 2>
//! └── flags: TypeFlags
//! ```
//!
//! Descriptors are only mutable through `RegistryBuilder`. Once the registry
//! is built they are read-only.

use crate::object::capability::CapabilityId;
use crate::object::instance::Instance;
use crate::op::OpId;
use crate::value::Value;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Type Id
// =============================================================================

/// Identifier of a type within one registry.
///
/// Ids are assigned in definition order. Bases are always defined before the
/// types deriving from them, so a base id is always smaller than the id of
/// any descendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Raw id value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Type Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags describing type state, computed when the registry is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        /// Some reachable operation resolves to a required slot.
        const ABSTRACT = 1 << 0;
        /// Type cannot be derived from.
        const SEALED = 1 << 1;
        /// Some reachable operation has more than one final overrider.
        const HAS_AMBIGUITY = 1 << 2;
    }
}

impl Default for TypeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Slots
// =============================================================================

/// An operation implementation.
pub type Method = Arc<dyn Fn(&Instance, &[Value]) -> Value + Send + Sync>;

/// Wrap a closure as a [`Method`].
pub fn method<F>(f: F) -> Method
where
    F: Fn(&Instance, &[Value]) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One entry in a type's own dispatch table.
#[derive(Clone)]
pub enum Slot {
    /// A provided implementation.
    Bound(Method),
    /// A mandatory operation with no body at this type.
    Required,
}

impl Slot {
    #[inline]
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// The implementation, if bound.
    #[inline]
    pub fn method(&self) -> Option<&Method> {
        match self {
            Self::Bound(m) => Some(m),
            Self::Required => None,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound(_) => f.write_str("Bound(<method>)"),
            Self::Required => f.write_str("Required"),
        }
    }
}

/// Stack-allocated storage for direct bases.
/// Most types have 1-2 bases.
pub type Bases = SmallVec<[TypeId; 2]>;

/// Stack-allocated storage for a type and its ancestors.
pub type Lineage = SmallVec<[TypeId; 8]>;

// =============================================================================
// Type Descriptor
// =============================================================================

/// One type's dispatch table and ancestor links.
#[derive(Debug)]
pub struct TypeDescriptor {
    id: TypeId,
    name: Arc<str>,
    bases: Bases,
    lineage: Lineage,
    slots: Vec<(OpId, Slot)>,
    slot_index: FxHashMap<OpId, usize>,
    capabilities: SmallVec<[CapabilityId; 2]>,
    flags: TypeFlags,
}

impl TypeDescriptor {
    pub(crate) fn new(id: TypeId, name: Arc<str>, bases: Bases, lineage: Lineage) -> Self {
        Self {
            id,
            name,
            bases,
            lineage,
            slots: Vec::new(),
            slot_index: FxHashMap::default(),
            capabilities: SmallVec::new(),
            flags: TypeFlags::empty(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Direct bases in declaration order.
    #[inline]
    pub fn bases(&self) -> &[TypeId] {
        &self.bases
    }

    /// This type followed by every ancestor, each listed once.
    ///
    /// Order is depth-first, left-to-right over the bases.
    #[inline]
    pub fn lineage(&self) -> &[TypeId] {
        &self.lineage
    }

    /// Whether `other` is this type or one of its ancestors.
    #[inline]
    pub fn derives_from(&self, other: TypeId) -> bool {
        self.lineage.contains(&other)
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
    }

    /// Capabilities declared directly on this type.
    #[inline]
    pub fn own_capabilities(&self) -> &[CapabilityId] {
        &self.capabilities
    }

    // =========================================================================
    // Own Slots
    // =========================================================================

    /// The slot this type itself defines for `op`, ignoring ancestors.
    #[inline]
    pub fn own_slot(&self, op: OpId) -> Option<&Slot> {
        self.slot_index.get(&op).map(|&i| &self.slots[i].1)
    }

    /// Own slots in registration order.
    pub fn own_slots(&self) -> impl Iterator<Item = (OpId, &Slot)> {
        self.slots.iter().map(|(op, slot)| (*op, slot))
    }

    /// Number of own slots.
    #[inline]
    pub fn own_slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Insert a new own slot. Returns false if one already exists.
    pub(crate) fn insert_slot(&mut self, op: OpId, slot: Slot) -> bool {
        if self.slot_index.contains_key(&op) {
            return false;
        }
        self.slot_index.insert(op, self.slots.len());
        self.slots.push((op, slot));
        true
    }

    /// Insert or replace an own slot, keeping its original position.
    pub(crate) fn replace_slot(&mut self, op: OpId, slot: Slot) {
        match self.slot_index.get(&op) {
            Some(&i) => self.slots[i].1 = slot,
            None => {
                self.insert_slot(op, slot);
            }
        }
    }

    pub(crate) fn add_capability(&mut self, cap: CapabilityId) {
        if !self.capabilities.contains(&cap) {
            self.capabilities.push(cap);
        }
    }

    pub(crate) fn add_flags(&mut self, flags: TypeFlags) {
        self.flags |= flags;
    }
}
