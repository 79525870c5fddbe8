//! In-memory document store.

use std::collections::BTreeMap;

use ahash::AHashMap;
use uuid::Uuid;

use crate::document::Record;
use crate::error::Result;
use crate::store::DocumentStore;

/// An in-memory store keeping records in insertion order.
///
/// Replacing a record keeps its original position.
#[derive(Debug, Clone)]
pub struct MemoryStore<R> {
    records: BTreeMap<u64, R>,
    slots: AHashMap<Uuid, u64>,
    next_slot: u64,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        MemoryStore {
            records: BTreeMap::new(),
            slots: AHashMap::new(),
            next_slot: 0,
        }
    }
}

impl<R: Record> MemoryStore<R> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the records in insertion order without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.slots.clear();
    }

    fn insert(&mut self, record: R) {
        let slot = match self.slots.get(&record.id()) {
            Some(&slot) => slot,
            None => {
                let slot = self.next_slot;
                self.next_slot += 1;
                self.slots.insert(record.id(), slot);
                slot
            }
        };
        self.records.insert(slot, record);
    }
}

impl<R: Record> FromIterator<R> for MemoryStore<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl<R: Record> DocumentStore<R> for MemoryStore<R> {
    fn get_item(&self, id: &Uuid) -> Option<R> {
        self.slots
            .get(id)
            .and_then(|slot| self.records.get(slot))
            .cloned()
    }

    fn add(&mut self, record: R) -> Result<()> {
        self.insert(record);
        Ok(())
    }

    fn delete(&mut self, id: &Uuid) -> Result<Option<R>> {
        Ok(self
            .slots
            .remove(id)
            .and_then(|slot| self.records.remove(&slot)))
    }

    fn all(&self) -> Vec<R> {
        self.records.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.slots.contains_key(id)
    }
}
