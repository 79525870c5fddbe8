//! Schema: the set of field descriptors of a record type.

use ahash::AHashMap;

use crate::error::{Result, TesseraError};
use crate::schema::field::FieldDescriptor;

/// Ordered collection of [`FieldDescriptor`]s for one record type.
///
/// Field names are matched case-insensitively, as WQL attributes are.
#[derive(Debug)]
pub struct Schema<R> {
    fields: Vec<FieldDescriptor<R>>,
    by_name: AHashMap<String, usize>,
}

impl<R> Schema<R> {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Schema {
            fields: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Add a field to the schema.
    pub fn add_field(&mut self, field: FieldDescriptor<R>) -> Result<()> {
        let name = field.name();
        if name.is_empty() {
            return Err(TesseraError::schema("Field name cannot be empty"));
        }
        if name.split('.').any(str::is_empty) {
            return Err(TesseraError::schema(format!(
                "Field name '{name}' has an empty path segment"
            )));
        }

        let key = name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(TesseraError::schema(format!(
                "Field '{name}' already exists"
            )));
        }

        self.by_name.insert(key, self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    /// Add a field and return the schema, for chained construction.
    pub fn with_field(mut self, field: FieldDescriptor<R>) -> Result<Self> {
        self.add_field(field)?;
        Ok(self)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.fields[index])
    }

    /// Look up a field by name, failing for unknown names.
    pub fn require(&self, name: &str) -> Result<&FieldDescriptor<R>> {
        self.field(name)
            .ok_or_else(|| TesseraError::unknown_field(name))
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    /// Only the indexed fields.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDescriptor<R>> {
        self.fields.iter().filter(|f| f.is_indexed())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Schema<R> {
    fn clone(&self) -> Self {
        Schema {
            fields: self.fields.clone(),
            by_name: self.by_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::schema::field::FieldType;

    #[test]
    fn test_add_and_lookup() {
        let schema = Schema::<Document>::new()
            .with_field(FieldDescriptor::path("title", FieldType::Text))
            .unwrap()
            .with_field(FieldDescriptor::path("year", FieldType::Integer))
            .unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field("Title").unwrap().name(), "title");
        assert!(schema.field("missing").is_none());
        assert!(matches!(
            schema.require("missing"),
            Err(TesseraError::UnknownField(_))
        ));
    }

    #[test]
    fn test_duplicate_field() {
        let mut schema = Schema::<Document>::new();
        schema
            .add_field(FieldDescriptor::path("title", FieldType::Text))
            .unwrap();
        assert!(schema
            .add_field(FieldDescriptor::path("TITLE", FieldType::Keyword))
            .is_err());
        assert!(schema
            .add_field(FieldDescriptor::path("a..b", FieldType::Text))
            .is_err());
    }
}
