//! Records and field values.
//!
//! - [`Record`] - the trait every indexed record type implements
//! - [`Document`] - a ready-made schema-less record with nested objects
//! - [`FieldValue`] - the value an accessor reads off a record

#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;
pub mod record;

pub use document::{Document, DocumentBuilder};
pub use field_value::FieldValue;
pub use record::Record;
