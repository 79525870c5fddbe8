//! Posting collections.
//!
//! A posting records that a record contains a key, and at which positions.
//! Term postings carry the positions of every occurrence; numeric postings
//! always use position `0`.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::index::IdSet;

/// A single posting: one record and the ordered, de-duplicated positions
/// at which it contains the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Record id.
    pub id: Uuid,
    /// Positions of the key in the record's value.
    pub positions: BTreeSet<u32>,
}

/// The postings stored at one index node, at most one per record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postings {
    entries: BTreeMap<Uuid, BTreeSet<u32>>,
}

impl Postings {
    /// Create an empty collection.
    pub fn new() -> Self {
        Postings::default()
    }

    /// Upsert a posting: append `position` to the record's posting, creating
    /// it if needed.
    ///
    /// Returns `true` when a new posting was created for `id`. Adding a
    /// position that is already present is a no-op.
    pub fn add(&mut self, id: Uuid, position: u32) -> bool {
        let mut created = false;
        self.entries
            .entry(id)
            .or_insert_with(|| {
                created = true;
                BTreeSet::new()
            })
            .insert(position);
        created
    }

    /// Remove the posting of `id`. Returns whether one existed.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Positions of `id`, if it has a posting here.
    pub fn positions(&self, id: &Uuid) -> Option<&BTreeSet<u32>> {
        self.entries.get(id)
    }

    /// Whether `id` has a posting here.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.entries.contains_key(id)
    }

    /// Record ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &Uuid> {
        self.entries.keys()
    }

    /// Add all record ids to `out`.
    pub fn collect_into(&self, out: &mut IdSet) {
        out.extend(self.entries.keys().copied());
    }

    /// Iterate postings in id order.
    pub fn iter(&self) -> impl Iterator<Item = Posting> + '_ {
        self.entries.iter().map(|(id, positions)| Posting {
            id: *id,
            positions: positions.clone(),
        })
    }

    /// Number of postings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no postings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_deduplicates_positions() {
        let id = Uuid::new_v4();
        let mut postings = Postings::new();

        assert!(postings.add(id, 3));
        assert!(!postings.add(id, 1));
        assert!(!postings.add(id, 3));

        assert_eq!(postings.len(), 1);
        let positions: Vec<u32> = postings.positions(&id).unwrap().iter().copied().collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn test_remove() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut postings = Postings::new();
        postings.add(a, 0);
        postings.add(b, 0);

        assert!(postings.remove(&a));
        assert!(!postings.remove(&a));
        assert!(!postings.contains(&a));
        assert!(postings.contains(&b));

        let posting = postings.iter().next().unwrap();
        assert_eq!(posting.id, b);
        assert!(posting.positions.contains(&0));
    }
}
