//! Document store abstraction.
//!
//! The store is the only place full records live. Indexes hand back ids,
//! and the executor materializes them through [`DocumentStore::get_item`].

use uuid::Uuid;

use crate::document::Record;
use crate::error::Result;

pub mod memory;

pub use memory::MemoryStore;

/// A keyed collection of records.
///
/// This provides a pluggable interface so a collection can sit on top of an
/// in-memory map, a database table or a remote service.
pub trait DocumentStore<R: Record>: Send + Sync {
    /// Fetch a copy of the record with `id`.
    fn get_item(&self, id: &Uuid) -> Option<R>;

    /// Insert a record, replacing any record with the same id.
    fn add(&mut self, record: R) -> Result<()>;

    /// Remove and return the record with `id`.
    fn delete(&mut self, id: &Uuid) -> Result<Option<R>>;

    /// Every record, in the store's natural order.
    fn all(&self) -> Vec<R>;

    /// Number of records.
    fn len(&self) -> usize;

    /// Whether the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record with `id` exists.
    fn contains(&self, id: &Uuid) -> bool {
        self.get_item(id).is_some()
    }
}
