//! Object table keyed by `(object number, generation)`.

use crate::object::{IndirectObject, ObjectRef};
use std::collections::HashMap;

/// Store of parsed indirect objects.
///
/// At most one object exists per `(number, generation)`; adding the same key again
/// replaces the earlier object. Objects sharing a number but not a generation are
/// kept side by side.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    objects: HashMap<u32, HashMap<u16, IndirectObject>>,
}

impl ObjectTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, returning the one it replaced (if any).
    pub fn add(&mut self, object: IndirectObject) -> Option<IndirectObject> {
        let previous = self
            .objects
            .entry(object.id)
            .or_default()
            .insert(object.gen, object);

        if let Some(prev) = &previous {
            log::warn!("Object {} redefined, keeping the latest definition", prev.reference());
        }
        previous
    }

    /// Look up an object by number and generation.
    pub fn get(&self, id: u32, gen: u16) -> Option<&IndirectObject> {
        self.objects.get(&id)?.get(&gen)
    }

    /// Look up an object by reference.
    pub fn get_ref(&self, obj_ref: ObjectRef) -> Option<&IndirectObject> {
        self.get(obj_ref.id, obj_ref.gen)
    }

    /// Check if an object exists.
    pub fn contains(&self, obj_ref: ObjectRef) -> bool {
        self.get_ref(obj_ref).is_some()
    }

    /// Number of stored objects (all generations).
    pub fn len(&self) -> usize {
        self.objects.values().map(HashMap::len).sum()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all stored objects in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> + '_ {
        self.objects.values().flat_map(HashMap::values)
    }
}
