//! Error types for dispatch and ownership.
//!
//! Every failure is a programming-contract violation reported to the
//! immediate caller. Nothing here is retried or recovered internally.

use crate::object::capability::CapabilityId;
use crate::object::descriptor::TypeId;
use crate::object::registry::RegistryId;
use crate::op::OpId;
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// Why an operation has more than one final overrider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityKind {
    /// The competing definers share a common ancestor: a diamond whose
    /// paths override the operation differently.
    SharedBase { base: TypeId },
    /// The competing definers have no ancestor in common.
    UnrelatedBases,
}

/// Failures raised by the dispatch table registry.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("operation `{op}` is already bound on type `{type_name}`")]
    DuplicateBinding { type_name: Arc<str>, op: OpId },

    #[error("cannot instantiate abstract type `{type_name}`: unresolved {}", join_ops(.missing))]
    AbstractInstantiation {
        type_name: Arc<str>,
        missing: Vec<OpId>,
    },

    #[error(
        "operation `{op}` is ambiguous on type `{type_name}` ({kind:?}): defined by {} types",
        .candidates.len()
    )]
    AmbiguousOperation {
        type_name: Arc<str>,
        op: OpId,
        candidates: SmallVec<[TypeId; 2]>,
        kind: AmbiguityKind,
    },

    #[error("operation `{op}` has no implementation on type `{type_name}`")]
    UnresolvedOperation { type_name: Arc<str>, op: OpId },

    #[error("unknown type {0:?}")]
    UnknownType(TypeId),

    #[error("unknown type name `{0}`")]
    UnknownTypeName(Arc<str>),

    #[error("type name `{0}` is already defined")]
    DuplicateTypeName(Arc<str>),

    #[error("base `{base}` listed more than once for type `{type_name}`")]
    DuplicateBase { type_name: Arc<str>, base: Arc<str> },

    #[error("type `{base}` is sealed and cannot be derived from")]
    SealedBase { base: Arc<str> },

    #[error("type `{type_name}` lists {count} bases, limit is {limit}")]
    TooManyBases {
        type_name: Arc<str>,
        count: usize,
        limit: usize,
    },

    #[error("type `{type_name}` overrides `{op}` but no ancestor declares it")]
    NothingToOverride { type_name: Arc<str>, op: OpId },

    #[error("unknown capability {0:?}")]
    UnknownCapability(CapabilityId),

    #[error("type `{type_name}` does not provide capability `{capability}`")]
    MissingCapability {
        type_name: Arc<str>,
        capability: Arc<str>,
    },

    #[error("operation `{op}` is not part of capability `{capability}`")]
    NotInCapability { capability: Arc<str>, op: OpId },

    #[error("instance of type {type_id:?} was created by registry {owner:?}, not {registry:?}")]
    ForeignInstance {
        type_id: TypeId,
        owner: RegistryId,
        registry: RegistryId,
    },

    #[error("a global dispatch registry is already installed")]
    GlobalAlreadyInstalled,
}

/// Failures raised by [`UniqueOwner`](crate::owner::UniqueOwner).
#[derive(Debug, Clone, Error)]
pub enum OwnershipError {
    #[error("a unique owner cannot be copied")]
    CopyForbidden,

    #[error("the owner is empty")]
    EmptyOwner,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

fn join_ops(ops: &[OpId]) -> String {
    ops.iter()
        .map(|op| format!("`{}`", op))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstract_message_lists_ops() {
        let err = DispatchError::AbstractInstantiation {
            type_name: Arc::from("Animal"),
            missing: vec![OpId::intern("speak"), OpId::intern("eat")],
        };
        assert_eq!(
            err.to_string(),
            "cannot instantiate abstract type `Animal`: unresolved `speak`, `eat`"
        );
    }

    #[test]
    fn test_dispatch_error_wraps_into_ownership_error() {
        let err: OwnershipError = DispatchError::GlobalAlreadyInstalled.into();
        assert!(matches!(
            err,
            OwnershipError::Dispatch(DispatchError::GlobalAlreadyInstalled)
        ));
        assert_eq!(err.to_string(), "a global dispatch registry is already installed");
    }
}
