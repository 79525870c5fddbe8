//! Field descriptors: typed, named accessors over a record type.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::document::{Document, FieldValue};

/// Declared type of a field, which also selects its reverse index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed full text, indexed in a term trie.
    Text,
    /// Whole value as a single term, indexed in a term trie.
    Keyword,
    /// 64-bit integer, indexed in the numeric tree.
    Integer,
    /// 64-bit float, indexed in the numeric tree.
    Float,
    /// Boolean stored as `0`/`1` in the numeric tree.
    Boolean,
    /// UTC timestamp stored as Unix seconds in the numeric tree.
    DateTime,
}

impl FieldType {
    /// Whether values of this type go to the numeric range index.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Float | FieldType::Boolean | FieldType::DateTime
        )
    }

    /// Get the name of this field type.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
        }
    }
}

type Accessor<R> = Arc<dyn Fn(&R) -> FieldValue + Send + Sync>;

/// Describes one field of a record type.
///
/// Built once when the schema is assembled and immutable afterwards. The
/// accessor is a plain closure so reading a field never inspects types at
/// runtime.
pub struct FieldDescriptor<R> {
    name: String,
    field_type: FieldType,
    indexed: bool,
    analyzer: Option<Arc<dyn Analyzer>>,
    accessor: Accessor<R>,
}

impl<R> FieldDescriptor<R> {
    /// Create an indexed field reading its value with `accessor`.
    pub fn new<S, F>(name: S, field_type: FieldType, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> FieldValue + Send + Sync + 'static,
    {
        FieldDescriptor {
            name: name.into(),
            field_type,
            indexed: true,
            analyzer: None,
            accessor: Arc::new(accessor),
        }
    }

    /// Set whether this field is indexed.
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Use a specific analyzer for this field instead of the collection
    /// default.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// The field name (dotted for nested properties).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether a reverse index is maintained for this field.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// The analyzer override, if any.
    pub fn analyzer(&self) -> Option<&Arc<dyn Analyzer>> {
        self.analyzer.as_ref()
    }

    /// Read this field's value off a record.
    pub fn value(&self, record: &R) -> FieldValue {
        (self.accessor)(record)
    }
}

impl FieldDescriptor<Document> {
    /// Create a descriptor reading a (possibly dotted) path out of a
    /// [`Document`].
    ///
    /// The path is split into segments on first access and memoized.
    pub fn path<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        let name = name.into();
        let path = name.clone();
        let segments: Arc<OnceLock<Vec<String>>> = Arc::new(OnceLock::new());
        FieldDescriptor::new(name, field_type, move |doc: &Document| {
            let segments = segments.get_or_init(|| path.split('.').map(str::to_string).collect());
            doc.get_path(segments.as_slice()).cloned().unwrap_or(FieldValue::Null)
        })
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        FieldDescriptor {
            name: self.name.clone(),
            field_type: self.field_type,
            indexed: self.indexed,
            analyzer: self.analyzer.clone(),
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("indexed", &self.indexed)
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name()))
            .finish()
    }
}
