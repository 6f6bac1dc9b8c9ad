//! Operation identifiers.
//!
//! An [`OpId`] names one capability (method signature). Names are interned
//! process-wide, so the same name always yields the same id and ids can be
//! compared and hashed without touching the string.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

/// Interned operation identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u32);

impl OpId {
    /// Intern an operation name.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct names are interned.
    pub fn intern(name: &str) -> Self {
        interner().intern(name)
    }

    /// Look up an already interned name without creating it.
    pub fn lookup(name: &str) -> Option<Self> {
        interner().names.read().ids.get(name).copied()
    }

    /// The operation name.
    pub fn name(self) -> Arc<str> {
        interner().resolve(self)
    }

    /// Raw id value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpId({}, {:?})", self.0, &*self.name())
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<&str> for OpId {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

// =============================================================================
// Interner
// =============================================================================

#[derive(Default)]
struct Names {
    ids: FxHashMap<Arc<str>, OpId>,
    strings: Vec<Arc<str>>,
}

struct Interner {
    names: RwLock<Names>,
}

impl Interner {
    fn intern(&self, name: &str) -> OpId {
        if let Some(id) = self.names.read().ids.get(name) {
            return *id;
        }

        let mut names = self.names.write();
        // Another thread may have won the race between the two locks.
        if let Some(id) = names.ids.get(name) {
            return *id;
        }
        let Some(id) = next_id(names.strings.len()) else {
            panic!("operation interner exhausted: more than u32::MAX names");
        };
        let name: Arc<str> = Arc::from(name);
        names.strings.push(name.clone());
        names.ids.insert(name, id);
        id
    }

    fn resolve(&self, id: OpId) -> Arc<str> {
        // Ids are only minted by `intern`, so the index is always in range.
        self.names.read().strings[id.0 as usize].clone()
    }
}

/// Id for the name stored at `len`, if it still fits in a `u32`.
fn next_id(len: usize) -> Option<OpId> {
    u32::try_from(len).ok().map(OpId)
}

static INTERNER: OnceLock<Interner> = OnceLock::new();

fn interner() -> &'static Interner {
    INTERNER.get_or_init(|| Interner {
        names: RwLock::new(Names::default()),
    })
}
