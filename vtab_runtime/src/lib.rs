//! Minimal object runtime: virtual dispatch tables and unique ownership.
//!
//! This crate provides:
//! - Type descriptors with explicit ancestor graphs (single, multiple and
//!   shared-base inheritance)
//! - A dispatch table registry resolving operations to their final overrider
//! - Required (abstract) operations and instantiation checks
//! - Capability-typed, non-owning polymorphic handles
//! - `UniqueOwner`, an exclusive owner with exactly-once release
//!
//! # Example
//!
//! ```
//! use vtab_runtime::{DispatchError, Fields, RegistryBuilder, Value, method};
//!
//! let mut builder = RegistryBuilder::new();
//! let animal = builder.define_type("Animal", &[])?;
//! builder.declare_required(animal, "speak")?;
//! let cat = builder.define_type("Cat", &[animal])?;
//! builder.register(cat, "speak", method(|_, _| Value::str("Meow")))?;
//! let registry = builder.build();
//!
//! let tom = registry.construct(cat, Fields::default())?;
//! let resolved = registry.resolve(tom.borrow().unwrap(), "speak")?;
//! assert_eq!(resolved.defining_type, cat);
//!
//! assert!(matches!(
//!     registry.instantiate(animal, Fields::default()),
//!     Err(DispatchError::AbstractInstantiation { .. })
//! ));
//! # Ok::<(), DispatchError>(())
//! ```

pub mod config;
pub mod error;
pub mod object;
pub mod op;
pub mod owner;
pub mod value;

// Re-export commonly used items
pub use config::RegistryConfig;
pub use error::{AmbiguityKind, DispatchError, OwnershipError};
pub use object::capability::{Capability, CapabilityId};
pub use object::descriptor::{Method, Slot, TypeDescriptor, TypeFlags, TypeId, method};
pub use object::handle::Handle;
pub use object::instance::{Fields, Instance, fields};
pub use object::registry::{
    DispatchRegistry, RegistryBuilder, RegistryId, global_registry, install_global,
};
pub use object::resolve::Resolved;
pub use op::OpId;
pub use owner::{OwnerState, UniqueOwner};
pub use value::Value;
