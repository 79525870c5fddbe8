//! Schema definition for record types.

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;

pub use field::{FieldDescriptor, FieldType};
pub use schema::Schema;
