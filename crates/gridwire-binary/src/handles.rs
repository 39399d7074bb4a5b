//! Back-reference table for shared and cyclic object graphs.

use std::collections::HashMap;
use std::rc::Rc;

/// Identity of a shared object: the address of its `Rc` allocation.
///
/// Two identities are equal exactly when they come from clones of the same
/// `Rc`. An identity is only meaningful while the object is alive, which
/// holds for the duration of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentity(usize);

impl ObjectIdentity {
    /// Identity of the value behind `rc`.
    #[must_use]
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

#[derive(Debug, Default)]
enum Slots {
    #[default]
    Empty,
    Single(ObjectIdentity, usize),
    Multiple(HashMap<ObjectIdentity, usize>),
}

/// Maps object identities to the position of their first write.
///
/// Most graphs hold at most one shared object, so the first entry is stored
/// inline and a map is only allocated for the second.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Slots,
}

impl HandleTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `identity` at `pos` unless already present.
    ///
    /// Returns the earlier position when the identity was seen before; the
    /// table is left unchanged in that case.
    pub fn put(&mut self, identity: ObjectIdentity, pos: usize) -> Option<usize> {
        match &mut self.slots {
            Slots::Empty => {
                self.slots = Slots::Single(identity, pos);
                None
            }
            Slots::Single(existing, old) if *existing == identity => Some(*old),
            Slots::Single(existing, old) => {
                let mut map = HashMap::with_capacity(4);
                map.insert(*existing, *old);
                map.insert(identity, pos);
                self.slots = Slots::Multiple(map);
                None
            }
            Slots::Multiple(map) => match map.get(&identity) {
                Some(&old) => Some(old),
                None => {
                    map.insert(identity, pos);
                    None
                }
            },
        }
    }

    /// Number of recorded objects.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.slots {
            Slots::Empty => 0,
            Slots::Single(..) => 1,
            Slots::Multiple(map) => map.len(),
        }
    }

    /// Whether nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
