//! The record abstraction indexed by collections.

use uuid::Uuid;

/// Anything that can be stored in a collection.
///
/// A record only has to expose its globally unique identifier; field values
/// are read through the accessors of a [`Schema`](crate::schema::Schema).
pub trait Record: Clone + Send + Sync + 'static {
    /// The 128-bit unique identifier of this record.
    fn id(&self) -> Uuid;
}
