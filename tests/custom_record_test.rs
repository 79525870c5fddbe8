//! Collections over a user-defined record type with custom WQL extensions.

use std::ops::RangeInclusive;
use std::sync::Arc;

use tessera::index::Lookup;
use tessera::prelude::*;
use tessera::wql::condition::{ConditionKind, ConditionOperator, ConditionOptions, Like};
use tessera::wql::{Value, WqlFunction};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
struct Book {
    id: Uuid,
    title: String,
    year: i64,
    tags: Vec<String>,
    in_print: bool,
}

impl Record for Book {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Book {
    fn new(title: &str, year: i64, tags: &[&str], in_print: bool) -> Self {
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            year,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            in_print,
        }
    }
}

fn schema() -> Result<Schema<Book>> {
    Schema::new()
        .with_field(FieldDescriptor::new("title", FieldType::Text, |b: &Book| {
            FieldValue::from(b.title.as_str())
        }))?
        .with_field(FieldDescriptor::new("year", FieldType::Integer, |b: &Book| {
            FieldValue::Integer(b.year)
        }))?
        .with_field(FieldDescriptor::new("tags", FieldType::Keyword, |b: &Book| {
            FieldValue::Array(b.tags.iter().map(|t| FieldValue::from(t.as_str())).collect())
        }))?
        .with_field(FieldDescriptor::new("in_print", FieldType::Boolean, |b: &Book| {
            FieldValue::Boolean(b.in_print)
        }))
}

fn library() -> Result<(Collection<Book>, Vec<Book>)> {
    let books = vec![
        Book::new("The Rust Programming Language", 2018, &["rust", "beginner"], true),
        Book::new("Programming Rust", 2017, &["rust", "systems"], true),
        Book::new("Rust for Rustaceans", 2021, &["rust", "advanced"], true),
        Book::new("Structure and Interpretation of Computer Programs", 1985, &["lisp"], false),
    ];
    let mut collection = Collection::new(schema()?)?;
    collection.add_all(books.clone())?;
    Ok((collection, books))
}

/// `not like`: the complement of `like`.
#[derive(Debug, Default)]
struct NotLike;

impl ConditionOperator for NotLike {
    fn operators(&self) -> &[&'static str] {
        &["not like", "!~"]
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
        let matches = Like.evaluate(lookup, parameters, options)?;
        Ok(lookup.all().difference(&matches).copied().collect())
    }
}

/// `decade(n)`: the first year of the decade `n` falls in.
#[derive(Debug, Default)]
struct Decade;

impl WqlFunction for Decade {
    fn name(&self) -> &'static str {
        "decade"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn evaluate(&self, arguments: &[Value], culture: &Culture) -> Result<Value> {
        let year = arguments
            .first()
            .and_then(|v| v.as_number(culture))
            .ok_or_else(|| anyhow::anyhow!("decade() expects a year"))?;
        Ok(Value::Number((year / 10.0).floor() * 10.0))
    }
}

#[test]
fn test_custom_record_queries() -> Result<()> {
    let (collection, books) = library()?;

    assert_eq!(collection.query("tags = lisp")?, vec![books[3].clone()]);
    assert_eq!(collection.query("tags = rust")?.len(), 3);
    assert_eq!(collection.query("in_print = false")?, vec![books[3].clone()]);

    let titles: Vec<String> = collection
        .query("tags = rust order by year desc")?
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(
        titles,
        vec![
            "Rust for Rustaceans",
            "The Rust Programming Language",
            "Programming Rust"
        ]
    );
    Ok(())
}

#[test]
fn test_custom_condition_and_function() -> Result<()> {
    let (mut collection, books) = library()?;
    collection
        .registry_mut()
        .register_condition(Arc::new(NotLike))?;
    collection.registry_mut().register_function_type::<Decade>()?;

    let found = collection.query("title not like rust")?;
    assert_eq!(found, vec![books[3].clone()]);
    assert_eq!(collection.query("title !~ rust")?, found);

    let found = collection.query("year >= decade(2019) order by year")?;
    assert_eq!(found, vec![books[0].clone(), books[2].clone()]);
    Ok(())
}

#[test]
fn test_duplicate_registration_is_rejected() -> Result<()> {
    let (mut collection, _) = library()?;
    collection.registry_mut().register_condition(Arc::new(NotLike))?;

    let error = collection
        .registry_mut()
        .register_condition(Arc::new(NotLike))
        .unwrap_err();
    assert!(matches!(error, TesseraError::DuplicateRegistration(_)));

    let error = collection
        .registry_mut()
        .register_condition_type::<Like>()
        .unwrap_err();
    assert!(matches!(error, TesseraError::DuplicateRegistration(_)));

    collection.registry_mut().remove_condition("like");
    collection.registry_mut().register_condition_type::<Like>()?;
    Ok(())
}

#[test]
fn test_removed_condition_no_longer_parses() -> Result<()> {
    let (mut collection, _) = library()?;
    assert!(collection.registry_mut().remove_condition("not in").is_some());

    let statement = collection.parse("tags not in (rust)");
    assert!(statement.has_errors());
    // `in` alone still works
    assert_eq!(collection.query("tags in (lisp)")?.len(), 1);
    Ok(())
}
