//! Per-field reverse index.
//!
//! A [`FieldIndex`] binds a [`FieldDescriptor`] to either a term trie
//! (text and keyword fields, fed through an analyzer) or a numeric tree
//! (integer, float, boolean and date time fields).

use std::sync::Arc;

use log::debug;

use crate::analysis::{Analyzer, Token};
use crate::culture::Culture;
use crate::document::{FieldValue, Record};
use crate::error::{Result, TesseraError};
use crate::index::numeric::NumericTree;
use crate::index::options::RetrieveOptions;
use crate::index::trie::TermTrie;
use crate::index::{IdSet, Lookup};
use crate::schema::{FieldDescriptor, FieldType};
use crate::wql::ast::Value;

/// The reverse index structure backing a field.
#[derive(Debug, Clone)]
pub enum ReverseIndex {
    /// Analyzed terms in a character trie.
    Terms {
        /// The trie.
        trie: TermTrie,
        /// Analyzer applied to record values and query values alike.
        analyzer: Arc<dyn Analyzer>,
    },
    /// Numeric values in an AVL tree.
    Numeric(NumericTree),
}

/// Reverse index over one field of a record type.
pub struct FieldIndex<R> {
    descriptor: FieldDescriptor<R>,
    culture: Culture,
    index: ReverseIndex,
}

impl<R: Record> FieldIndex<R> {
    /// Create an empty index for `descriptor`.
    ///
    /// `analyzer` is only used by text and keyword fields.
    pub fn new(descriptor: FieldDescriptor<R>, analyzer: Arc<dyn Analyzer>, culture: Culture) -> Self {
        let index = if descriptor.field_type().is_numeric() {
            ReverseIndex::Numeric(NumericTree::new())
        } else {
            ReverseIndex::Terms {
                trie: TermTrie::new(),
                analyzer,
            }
        };
        FieldIndex {
            descriptor,
            culture,
            index,
        }
    }

    /// The field this index covers.
    pub fn descriptor(&self) -> &FieldDescriptor<R> {
        &self.descriptor
    }

    /// Index the field value of `record`.
    pub fn add(&mut self, record: &R) -> Result<()> {
        let value = self.descriptor.value(record);
        match &mut self.index {
            ReverseIndex::Terms { trie, analyzer } => {
                let tokens = analyze_value(&value, analyzer.as_ref(), &self.culture)?;
                trie.add(record.id(), &tokens);
            }
            ReverseIndex::Numeric(tree) => {
                for number in numeric_values(&value, self.descriptor.field_type(), &self.culture) {
                    tree.add(record.id(), number);
                }
            }
        }
        Ok(())
    }

    /// Index an explicit token list for `record`, bypassing the analyzer.
    pub fn add_tokens(&mut self, record: &R, tokens: &[Token]) -> Result<()> {
        let trie = self.trie_mut()?;
        trie.add(record.id(), tokens);
        Ok(())
    }

    /// Remove the postings of `record` for its current field value.
    pub fn delete(&mut self, record: &R) -> Result<()> {
        let value = self.descriptor.value(record);
        match &mut self.index {
            ReverseIndex::Terms { trie, analyzer } => {
                let tokens = analyze_value(&value, analyzer.as_ref(), &self.culture)?;
                trie.delete(record.id(), &tokens);
            }
            ReverseIndex::Numeric(tree) => {
                for number in numeric_values(&value, self.descriptor.field_type(), &self.culture) {
                    tree.delete(record.id(), number);
                }
            }
        }
        Ok(())
    }

    /// Remove the postings of `record` for an explicit token list.
    pub fn delete_tokens(&mut self, record: &R, tokens: &[Token]) -> Result<()> {
        let trie = self.trie_mut()?;
        trie.delete(record.id(), tokens);
        Ok(())
    }

    /// Remove everything from the index.
    pub fn clear(&mut self) {
        match &mut self.index {
            ReverseIndex::Terms { trie, .. } => trie.clear(),
            ReverseIndex::Numeric(tree) => tree.clear(),
        }
    }

    fn trie_mut(&mut self) -> Result<&mut TermTrie> {
        match &mut self.index {
            ReverseIndex::Terms { trie, .. } => Ok(trie),
            ReverseIndex::Numeric(_) => Err(TesseraError::index(format!(
                "field '{}' is numeric and does not accept explicit tokens",
                self.descriptor.name()
            ))),
        }
    }

    /// Turn a query value into the numeric key this field stores.
    fn query_number(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Text(text) => {
                numeric_values(&FieldValue::Text(text.clone()), self.descriptor.field_type(), &self.culture)
                    .into_iter()
                    .next()
            }
        }
    }
}

impl<R: Record> Lookup for FieldIndex<R> {
    fn field_name(&self) -> &str {
        self.descriptor.name()
    }

    fn retrieve(&self, value: &Value, options: &RetrieveOptions) -> Result<IdSet> {
        match &self.index {
            ReverseIndex::Terms { trie, analyzer } => {
                let text = value.to_index_text();
                let terms: Vec<String> = analyzer
                    .analyze(&text, &self.culture)?
                    .into_iter()
                    .map(|token| token.text)
                    .collect();
                Ok(trie.retrieve(&terms, options))
            }
            ReverseIndex::Numeric(tree) => match self.query_number(value) {
                Some(number) => Ok(tree.retrieve(number, options)),
                None => {
                    debug!(
                        "value {} is not numeric for field '{}'",
                        value,
                        self.descriptor.name()
                    );
                    Ok(IdSet::new())
                }
            },
        }
    }

    fn all(&self) -> IdSet {
        match &self.index {
            ReverseIndex::Terms { trie, .. } => trie.all(),
            ReverseIndex::Numeric(tree) => tree.all(),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self.index, ReverseIndex::Numeric(_))
    }
}

impl<R> std::fmt::Debug for FieldIndex<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldIndex")
            .field("field", &self.descriptor.name())
            .field("index", &self.index)
            .finish()
    }
}

/// Tokens of a field value for a term index.
///
/// Array elements are analyzed one by one so a keyword array yields one
/// term per element. Positions continue across elements.
fn analyze_value(value: &FieldValue, analyzer: &dyn Analyzer, culture: &Culture) -> Result<Vec<Token>> {
    match value {
        FieldValue::Array(values) => {
            let mut tokens = Vec::new();
            for element in values {
                let offset = tokens.last().map_or(0, |t: &Token| t.position + 1);
                tokens.extend(
                    analyze_value(element, analyzer, culture)?
                        .into_iter()
                        .map(|t| Token::new(t.text, t.position + offset)),
                );
            }
            Ok(tokens)
        }
        other => match other.to_index_text() {
            Some(text) => analyzer.analyze(&text, culture),
            None => Ok(Vec::new()),
        },
    }
}

/// Numeric keys of a field value for a numeric field type.
///
/// Text values are parsed according to the field type: date times accept
/// RFC 3339 dates, booleans accept the usual spellings, and every type
/// accepts a culture formatted number. Arrays contribute every element.
fn numeric_values(value: &FieldValue, field_type: FieldType, culture: &Culture) -> Vec<f64> {
    match value {
        FieldValue::Array(values) => values
            .iter()
            .flat_map(|v| numeric_values(v, field_type, culture))
            .collect(),
        FieldValue::Text(text) => {
            let parsed = match field_type {
                FieldType::DateTime => culture.parse_datetime(text),
                FieldType::Boolean => value.as_boolean().map(|b| if b { 1.0 } else { 0.0 }),
                _ => None,
            };
            parsed
                .or_else(|| culture.parse_number(text))
                .into_iter()
                .collect()
        }
        other => other.as_f64().into_iter().collect(),
    }
}
