//! Capability sets.
//!
//! A capability is a named set of operation-ids, the interface a [`Handle`]
//! is typed by. Types declare the capabilities they provide and every
//! descendant inherits them.
//!
//! [`Handle`]: crate::object::handle::Handle

use crate::op::OpId;
use smallvec::SmallVec;
use std::sync::Arc;

/// Identifier of a capability within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId(pub(crate) u32);

impl CapabilityId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A named operation set.
#[derive(Debug, Clone)]
pub struct Capability {
    id: CapabilityId,
    name: Arc<str>,
    ops: SmallVec<[OpId; 4]>,
}

impl Capability {
    pub(crate) fn new(id: CapabilityId, name: Arc<str>, ops: &[OpId]) -> Self {
        let mut unique: SmallVec<[OpId; 4]> = SmallVec::with_capacity(ops.len());
        for &op in ops {
            if !unique.contains(&op) {
                unique.push(op);
            }
        }
        Self {
            id,
            name,
            ops: unique,
        }
    }

    #[inline]
    pub fn id(&self) -> CapabilityId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Operations in declaration order, each listed once.
    #[inline]
    pub fn ops(&self) -> &[OpId] {
        &self.ops
    }

    #[inline]
    pub fn contains(&self, op: OpId) -> bool {
        self.ops.contains(&op)
    }
}
