//! Final-overrider resolution over the ancestor graph.
//!
//! # Rule
//!
//! For a type `T` and operation `op`:
//!
//! 1. If `T` has an own slot for `op`, `T` is the only final overrider.
//! 2. Otherwise the final overriders of every direct base are unioned,
//!    deduplicated by type identity.
//! 3. A candidate that is a proper ancestor of another candidate is dropped:
//!    the nearer definition dominates it.
//!
//! One remaining candidate resolves to that type's slot. Several remaining
//! candidates are ambiguous. No candidate means nothing on the graph defines
//! `op`.
//!
//! Because deduplication is by identity and not by path, a shared ancestor
//! reached through two paths contributes its definition once.
//!
//! # Paths
//!
//! - [`final_overriders`] scans the lineage on every call (lazy tables).
//!   The lineage is already deduplicated, so the scan is linear in the
//!   number of ancestors.
//! - [`build_vtable`] folds already-built base tables into a complete table
//!   for one type (eager tables). Both produce the same candidate lists.

use crate::error::{AmbiguityKind, DispatchError};
use crate::object::descriptor::{Method, Slot, TypeDescriptor, TypeId};
use crate::op::OpId;
use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

/// Final overriders of one operation.
pub type Overriders = SmallVec<[TypeId; 2]>;

/// Complete (operation → final overriders) table for one type.
pub type VTable = FxHashMap<OpId, Overriders>;

/// A successful resolution.
#[derive(Clone)]
pub struct Resolved<'a> {
    /// The resolved operation.
    pub op: OpId,
    /// Type whose own slot provided the implementation.
    pub defining_type: TypeId,
    /// The implementation.
    pub method: &'a Method,
}

impl std::fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("op", &self.op)
            .field("defining_type", &self.defining_type)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Candidate Computation
// =============================================================================

/// Compute the final overriders of `op` for `ty` from its lineage.
///
/// The result equals the recursive rule: every type in the lineage with an
/// own slot is a candidate, and dominated candidates are dropped.
pub fn final_overriders(types: &[TypeDescriptor], ty: TypeId, op: OpId) -> Overriders {
    let desc = &types[ty.index()];
    if desc.own_slot(op).is_some() {
        return smallvec![ty];
    }

    let mut candidates: Overriders = desc
        .lineage()
        .iter()
        .copied()
        .filter(|t| types[t.index()].own_slot(op).is_some())
        .collect();
    retain_dominant(types, &mut candidates);
    candidates
}

/// Build the complete table for `ty` from the tables of its bases.
///
/// `tables` must hold a finished table for every base of `ty`, indexed by
/// `TypeId`.
pub fn build_vtable(types: &[TypeDescriptor], tables: &[VTable], ty: TypeId) -> VTable {
    let desc = &types[ty.index()];
    let mut table = VTable::default();

    for &base in desc.bases() {
        for (&op, base_candidates) in &tables[base.index()] {
            let entry = table.entry(op).or_default();
            for &candidate in base_candidates {
                if !entry.contains(&candidate) {
                    entry.push(candidate);
                }
            }
        }
    }
    for candidates in table.values_mut() {
        retain_dominant(types, candidates);
    }

    for (op, _) in desc.own_slots() {
        table.insert(op, smallvec![ty]);
    }
    table
}

/// Every operation-id with a slot anywhere in the lineage of `ty`, listed
/// once, nearest type first.
pub fn reachable_ops(types: &[TypeDescriptor], ty: TypeId) -> Vec<OpId> {
    let mut ops = Vec::new();
    for &t in types[ty.index()].lineage() {
        for (op, _) in types[t.index()].own_slots() {
            if !ops.contains(&op) {
                ops.push(op);
            }
        }
    }
    ops
}

/// Drop every candidate that is a proper ancestor of another candidate.
fn retain_dominant(types: &[TypeDescriptor], candidates: &mut Overriders) {
    if candidates.len() < 2 {
        return;
    }
    let snapshot = candidates.clone();
    candidates.retain(|c| {
        !snapshot
            .iter()
            .any(|&other| other != *c && types[other.index()].derives_from(*c))
    });
}

// =============================================================================
// Classification
// =============================================================================

/// Turn a candidate list into a resolution result.
pub fn classify<'a>(
    types: &'a [TypeDescriptor],
    ty: TypeId,
    op: OpId,
    candidates: &[TypeId],
) -> Result<Resolved<'a>, DispatchError> {
    match candidates {
        [] => Err(unresolved(types, ty, op)),
        [definer] => match types[definer.index()].own_slot(op) {
            Some(Slot::Bound(method)) => Ok(Resolved {
                op,
                defining_type: *definer,
                method,
            }),
            _ => Err(unresolved(types, ty, op)),
        },
        _ => Err(DispatchError::AmbiguousOperation {
            type_name: types[ty.index()].name().clone(),
            op,
            candidates: candidates.iter().copied().collect(),
            kind: ambiguity_kind(types, candidates),
        }),
    }
}

/// Whether `op` is left without a body: no candidate at all, or any
/// remaining candidate is a required declaration.
///
/// A required slot that survives dominance was never overridden on this
/// path, even if an unrelated base binds the same operation.
pub fn is_unimplemented(types: &[TypeDescriptor], op: OpId, candidates: &[TypeId]) -> bool {
    candidates.is_empty()
        || candidates.iter().any(|c| {
            types[c.index()]
                .own_slot(op)
                .is_some_and(Slot::is_required)
        })
}

/// Find the nearest ancestor shared by all candidates, if any.
pub fn ambiguity_kind(types: &[TypeDescriptor], candidates: &[TypeId]) -> AmbiguityKind {
    let Some((first, rest)) = candidates.split_first() else {
        return AmbiguityKind::UnrelatedBases;
    };
    types[first.index()]
        .lineage()
        .iter()
        .copied()
        .find(|&base| rest.iter().all(|c| types[c.index()].derives_from(base)))
        .map_or(AmbiguityKind::UnrelatedBases, |base| {
            AmbiguityKind::SharedBase { base }
        })
}

fn unresolved(types: &[TypeDescriptor], ty: TypeId, op: OpId) -> DispatchError {
    DispatchError::UnresolvedOperation {
        type_name: types[ty.index()].name().clone(),
        op,
    }
}
