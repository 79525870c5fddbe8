//! Statement execution.
//!
//! [`Executor::apply`] evaluates a statement against a collection's indexes
//! and materializes matches through its document store.
//! [`Executor::apply_to`] evaluates the same statement against a candidate
//! sequence by indexing the candidates with the collection's analyzers, so
//! both paths share one evaluation routine and agree on every input.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use crate::analysis::Analyzer;
use crate::culture::Culture;
use crate::document::Record;
use crate::error::Result;
use crate::index::{IdSet, IndexCatalog, IndexSource};
use crate::schema::Schema;
use crate::store::DocumentStore;
use crate::wql::ast::{EvalContext, Filter};
use crate::wql::statement::Statement;

/// Runs statements for one record type.
pub struct Executor<'a, R> {
    schema: &'a Schema<R>,
    analyzer: Arc<dyn Analyzer>,
    culture: &'a Culture,
    max_results: Option<usize>,
}

impl<'a, R: Record> Executor<'a, R> {
    /// `analyzer` and `culture` must be the ones the collection indexes
    /// records with.
    pub fn new(schema: &'a Schema<R>, analyzer: Arc<dyn Analyzer>, culture: &'a Culture) -> Self {
        Executor {
            schema,
            analyzer,
            culture,
            max_results: None,
        }
    }

    /// Cap the id set of every condition.
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Evaluate `statement` against `catalog` and materialize the matches
    /// from `store`.
    ///
    /// Filter matches come back in ascending id order, an unfiltered
    /// statement returns the store's records in store order. Order and
    /// partitioning are applied afterwards. A statement with a parse error
    /// yields no records.
    pub fn apply<S>(
        &self,
        statement: &Statement,
        catalog: &IndexCatalog<R>,
        store: &S,
    ) -> Result<Vec<R>>
    where
        S: DocumentStore<R> + ?Sized,
    {
        if statement.has_errors() {
            debug!("not applying erroneous statement '{}'", statement.raw());
            return Ok(Vec::new());
        }

        let records = match statement.filter() {
            Some(filter) => self
                .evaluate(filter, catalog, statement)?
                .iter()
                .filter_map(|id| store.get_item(id))
                .collect(),
            None => store.all(),
        };
        self.finish(statement, records)
    }

    /// Evaluate `statement` against `candidates` instead of the collection.
    ///
    /// Filter matches come back in ascending id order, an unfiltered
    /// statement keeps the candidate order.
    pub fn apply_to(&self, statement: &Statement, candidates: Vec<R>) -> Result<Vec<R>> {
        if statement.has_errors() {
            debug!("not applying erroneous statement '{}'", statement.raw());
            return Ok(Vec::new());
        }

        let records = match statement.filter() {
            Some(filter) => {
                let catalog = IndexCatalog::build(
                    self.schema,
                    Arc::clone(&self.analyzer),
                    self.culture,
                    &candidates,
                )?;
                let ids = self.evaluate(filter, &catalog, statement)?;
                let matches: BTreeMap<Uuid, R> = candidates
                    .into_iter()
                    .filter(|record| ids.contains(&record.id()))
                    .map(|record| (record.id(), record))
                    .collect();
                matches.into_values().collect()
            }
            None => candidates,
        };
        self.finish(statement, records)
    }

    fn evaluate(
        &self,
        filter: &Filter,
        source: &dyn IndexSource,
        statement: &Statement,
    ) -> Result<IdSet> {
        let context =
            EvalContext::new(source, statement.culture()).with_max_results(self.max_results);
        let ids = filter.evaluate(&context)?;
        debug!("'{}' matched {} record(s)", statement.raw(), ids.len());
        Ok(ids)
    }

    fn finish(&self, statement: &Statement, records: Vec<R>) -> Result<Vec<R>> {
        let records = match statement.order() {
            Some(order) => order.sort(records, self.schema)?,
            None => records,
        };
        Ok(match statement.partitioning() {
            Some(partitioning) => partitioning.apply(records),
            None => records,
        })
    }
}
