//! Unique ownership of heap values.
//!
//! A [`UniqueOwner`] holds at most one boxed value and is the only owner of
//! it. Ownership moves with [`UniqueOwner::move_from`] or
//! [`UniqueOwner::take`]; the value is dropped exactly once, either by an
//! explicit [`UniqueOwner::release`] or when the owner goes out of scope.
//!
//! # States
//!
//! ```text
//!            new(value)                 move_from(src Owning)
//!   ────────────────────▶ Owning ◀─────────────────────────────┐
//!                           │                                  │
//!                 release() │                                  │
//!                           ▼                                  │
//!   empty() ───────────▶ Empty ──── release() (no-op) ─────────┘
//! ```

use crate::error::OwnershipError;
use crate::object::capability::CapabilityId;
use crate::object::handle::Handle;
use crate::object::instance::Instance;
use crate::object::registry::DispatchRegistry;
use std::fmt;
use tracing::trace;

/// Whether an owner currently holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerState {
    Empty,
    Owning,
}

/// Exclusive owner of one heap-allocated value.
///
/// `UniqueOwner` is neither `Clone` nor `Copy`:
///
/// ```compile_fail
/// use vtab_runtime::UniqueOwner;
///
/// let a = UniqueOwner::new(5);
/// let b: UniqueOwner<i32> = a.clone();
/// ```
///
/// The runtime counterpart, [`try_clone`](Self::try_clone), always fails.
pub struct UniqueOwner<T> {
    value: Option<Box<T>>,
}

impl<T> UniqueOwner<T> {
    /// Allocate `value` and take ownership of it.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
        }
    }

    /// Create an owner holding nothing.
    #[inline]
    pub const fn empty() -> Self {
        Self { value: None }
    }

    #[inline]
    pub fn state(&self) -> OwnerState {
        if self.value.is_some() {
            OwnerState::Owning
        } else {
            OwnerState::Empty
        }
    }

    #[inline]
    pub fn is_owning(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Take the value held by `other`, leaving `other` empty.
    ///
    /// Whatever `self` held is released first. Moving from an empty owner
    /// leaves both owners empty.
    pub fn move_from(&mut self, other: &mut UniqueOwner<T>) {
        // Free-then-take: the old value is gone before the new one lands.
        self.release();
        self.value = other.value.take();
    }

    /// Move the value out into a new owner, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> UniqueOwner<T> {
        UniqueOwner {
            value: self.value.take(),
        }
    }

    /// Drop the held value, if any.
    ///
    /// Returns whether a value was released. Calling this on an empty owner
    /// is a no-op, so repeated calls release at most once.
    pub fn release(&mut self) -> bool {
        match self.value.take() {
            Some(value) => {
                drop(value);
                trace!(type_name = std::any::type_name::<T>(), "released owned value");
                true
            }
            None => false,
        }
    }

    /// Borrow the held value.
    #[inline]
    pub fn borrow(&self) -> Result<&T, OwnershipError> {
        self.value.as_deref().ok_or(OwnershipError::EmptyOwner)
    }

    /// Mutably borrow the held value.
    #[inline]
    pub fn borrow_mut(&mut self) -> Result<&mut T, OwnershipError> {
        self.value.as_deref_mut().ok_or(OwnershipError::EmptyOwner)
    }

    /// Attempt to duplicate the owner.
    ///
    /// Always fails: a second owner would break single ownership. This holds
    /// in both states.
    #[inline]
    pub fn try_clone(&self) -> Result<Self, OwnershipError> {
        Err(OwnershipError::CopyForbidden)
    }

    /// Consume the owner and return the value, if any.
    pub fn into_inner(mut self) -> Option<T> {
        self.value.take().map(|boxed| *boxed)
    }
}

impl UniqueOwner<Instance> {
    /// View the owned instance through `cap`.
    ///
    /// The handle borrows `self`, so the owner cannot be emptied or moved
    /// while the handle is alive.
    pub fn handle<'a>(
        &'a self,
        registry: &'a DispatchRegistry,
        cap: CapabilityId,
    ) -> Result<Handle<'a>, OwnershipError> {
        let instance = self.borrow()?;
        Ok(registry.handle(instance, cap)?)
    }
}

impl<T> Default for UniqueOwner<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Drop for UniqueOwner<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for UniqueOwner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("UniqueOwner").field(value).finish(),
            None => f.write_str("UniqueOwner(<empty>)"),
        }
    }
}
