//! Condition operators.
//!
//! A condition operator turns resolved parameter values into a set of
//! record ids by calling into a field's [`Lookup`]. Operators never see
//! records, so the same operator serves the collection's own indexes and
//! indexes built over a candidate sequence.

use std::fmt::Debug;

use crate::error::{Result, TesseraError};
use crate::index::{IdSet, Lookup, RetrieveMethod, RetrieveOptions};
use crate::wql::ast::Value;

/// Shape of a condition in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// `attribute op parameter [~similarity] [:distance]`
    Binary,
    /// `attribute op (parameter, ...)`
    Set,
}

/// The `~similarity` and `:distance` options of a binary condition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConditionOptions {
    /// Edit distance for text, tolerance for numbers.
    pub similarity: Option<f64>,
    /// Maximum positional gap between consecutive terms.
    pub distance: Option<u32>,
}

/// A WQL condition operator.
///
/// Implementations are registered in a
/// [`Registry`](crate::wql::registry::Registry) under every spelling
/// returned by [`operators`](ConditionOperator::operators); the first
/// spelling is the one used when a statement is displayed. Spellings may
/// consist of several words, e.g. `not in`.
pub trait ConditionOperator: Send + Sync + Debug {
    /// Operator spellings, canonical spelling first.
    fn operators(&self) -> &[&'static str];

    /// Whether the operator takes one parameter or a parameter list.
    fn kind(&self) -> ConditionKind;

    /// Evaluate the condition against `lookup`.
    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet>;

    /// Canonical spelling.
    fn symbol(&self) -> &'static str {
        self.operators().first().copied().unwrap_or("")
    }
}

fn single<'a>(operator: &dyn ConditionOperator, parameters: &'a [Value]) -> Result<&'a Value> {
    match parameters {
        [value] => Ok(value),
        _ => Err(TesseraError::query(format!(
            "operator '{}' takes exactly one parameter, got {}",
            operator.symbol(),
            parameters.len()
        ))),
    }
}

fn equality_options(options: &ConditionOptions) -> RetrieveOptions {
    match options.distance {
        Some(distance) => RetrieveOptions::method(RetrieveMethod::Proximity).with_distance(distance),
        None => RetrieveOptions::method(RetrieveMethod::Phrase),
    }
}

fn complement(lookup: &dyn Lookup, matches: &IdSet) -> IdSet {
    lookup.all().difference(matches).copied().collect()
}

/// `=`: phrase match on text fields, equality on numeric fields. With a
/// `:distance` option the terms may be up to `distance` positions apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equal;

impl ConditionOperator for Equal {
    fn operators(&self) -> &[&'static str] {
        &["="]
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Binary
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet> {
        let value = single(self, parameters)?;
        lookup.retrieve(value, &equality_options(options))
    }
}

/// `!=`: every indexed record of the field that `=` does not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotEqual;

impl ConditionOperator for NotEqual {
    fn operators(&self) -> &[&'static str] {
        &["!=", "<>"]
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Binary
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet> {
        let value = single(self, parameters)?;
        let matches = lookup.retrieve(value, &equality_options(options))?;
        Ok(complement(lookup, &matches))
    }
}

/// `like` / `~`: prefix match, or a fuzzy match when a `~similarity` is
/// given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Like;

impl ConditionOperator for Like {
    fn operators(&self) -> &[&'static str] {
        &["like", "~"]
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Binary
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet> {
        let value = single(self, parameters)?;
        let retrieve = match options.similarity {
            Some(similarity) => {
                RetrieveOptions::method(RetrieveMethod::Fuzzy).with_similarity(similarity)
            }
            None => RetrieveOptions::method(RetrieveMethod::Prefix),
        };
        lookup.retrieve(value, &retrieve)
    }
}

/// One of the four comparison operators.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    spellings: &'static [&'static str],
    method: RetrieveMethod,
}

impl Comparison {
    /// `>`
    pub const fn greater_than() -> Self {
        Comparison {
            spellings: &[">"],
            method: RetrieveMethod::GreaterThan,
        }
    }

    /// `>=`
    pub const fn greater_than_or_equal() -> Self {
        Comparison {
            spellings: &[">="],
            method: RetrieveMethod::GreaterThanOrEqual,
        }
    }

    /// `<`
    pub const fn less_than() -> Self {
        Comparison {
            spellings: &["<"],
            method: RetrieveMethod::LessThan,
        }
    }

    /// `<=`
    pub const fn less_than_or_equal() -> Self {
        Comparison {
            spellings: &["<="],
            method: RetrieveMethod::LessThanOrEqual,
        }
    }
}

impl ConditionOperator for Comparison {
    fn operators(&self) -> &[&'static str] {
        self.spellings
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Binary
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        _options: &ConditionOptions,
    ) -> Result<IdSet> {
        let value = single(self, parameters)?;
        lookup.retrieve(value, &RetrieveOptions::method(self.method))
    }
}

/// `in`: union of the equality matches of every listed value.
#[derive(Debug, Clone, Copy, Default)]
pub struct In;

impl ConditionOperator for In {
    fn operators(&self) -> &[&'static str] {
        &["in"]
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Set
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet> {
        let retrieve = equality_options(options);
        let mut ids = IdSet::new();
        for value in parameters {
            ids.extend(lookup.retrieve(value, &retrieve)?);
        }
        Ok(ids)
    }
}

/// `not in`: every indexed record of the field that `in` does not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotIn;

impl ConditionOperator for NotIn {
    fn operators(&self) -> &[&'static str] {
        &["not in"]
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Set
    }

    fn evaluate(
        &self,
        lookup: &dyn Lookup,
        parameters: &[Value],
        options: &ConditionOptions,
    ) -> Result<IdSet> {
        let matches = In.evaluate(lookup, parameters, options)?;
        Ok(complement(lookup, &matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::tokens_from_words;
    use crate::index::TermTrie;
    use uuid::Uuid;

    /// A single-field lookup over a term trie, without any analysis.
    struct TrieLookup(TermTrie);

    impl Lookup for TrieLookup {
        fn field_name(&self) -> &str {
            "name"
        }

        fn retrieve(&self, value: &Value, options: &RetrieveOptions) -> Result<IdSet> {
            let terms: Vec<String> = value
                .to_index_text()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            Ok(self.0.retrieve(&terms, options))
        }

        fn all(&self) -> IdSet {
            self.0.all()
        }
    }

    fn fixture() -> (TrieLookup, Vec<Uuid>) {
        let mut trie = TermTrie::new();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        trie.add(ids[0], &tokens_from_words(["hello", "helena"]));
        trie.add(ids[1], &tokens_from_words(["hello", "big", "helge"]));
        trie.add(ids[2], &tokens_from_words(["goodbye"]));
        (TrieLookup(trie), ids)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_equal_and_not_equal() {
        let (lookup, ids) = fixture();
        let none = ConditionOptions::default();

        let found = Equal.evaluate(&lookup, &[text("hello helena")], &none).unwrap();
        assert_eq!(found, IdSet::from([ids[0]]));

        // helge is two positions after hello
        assert!(Equal
            .evaluate(&lookup, &[text("hello helge")], &none)
            .unwrap()
            .is_empty());
        let near = ConditionOptions {
            distance: Some(2),
            ..Default::default()
        };
        let found = Equal.evaluate(&lookup, &[text("hello helge")], &near).unwrap();
        assert_eq!(found, IdSet::from([ids[1]]));

        let found = NotEqual.evaluate(&lookup, &[text("hello")], &none).unwrap();
        assert_eq!(found, IdSet::from([ids[2]]));

        assert!(Equal.evaluate(&lookup, &[], &none).is_err());
    }

    #[test]
    fn test_like() {
        let (lookup, ids) = fixture();
        let found = Like
            .evaluate(&lookup, &[text("hel")], &ConditionOptions::default())
            .unwrap();
        assert_eq!(found, IdSet::from([ids[0], ids[1]]));

        let fuzzy = ConditionOptions {
            similarity: Some(1.0),
            ..Default::default()
        };
        let found = Like.evaluate(&lookup, &[text("helgx")], &fuzzy).unwrap();
        assert_eq!(found, IdSet::from([ids[1]]));
    }

    #[test]
    fn test_set_conditions() {
        let (lookup, ids) = fixture();
        let none = ConditionOptions::default();

        let found = In
            .evaluate(&lookup, &[text("helena"), text("goodbye")], &none)
            .unwrap();
        assert_eq!(found, IdSet::from([ids[0], ids[2]]));

        let found = NotIn
            .evaluate(&lookup, &[text("helena"), text("goodbye")], &none)
            .unwrap();
        assert_eq!(found, IdSet::from([ids[1]]));
    }

    #[test]
    fn test_comparison_symbols() {
        assert_eq!(Comparison::greater_than().symbol(), ">");
        assert_eq!(Comparison::less_than_or_equal().symbol(), "<=");
        assert_eq!(NotIn.kind(), ConditionKind::Set);
        assert_eq!(Like.operators(), &["like", "~"]);
    }
}
