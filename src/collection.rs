//! Collections: records, their indexes and WQL in one place.
//!
//! # Example
//!
//! ```
//! use tessera::collection::Collection;
//! use tessera::document::Document;
//! use tessera::schema::{FieldDescriptor, FieldType, Schema};
//!
//! let schema = Schema::new()
//!     .with_field(FieldDescriptor::path("text", FieldType::Text))
//!     .unwrap();
//! let mut collection = Collection::new(schema).unwrap();
//!
//! let helena = Document::builder().add_text("text", "Hello Helena").build();
//! let helge = Document::builder().add_text("text", "Hello Helge").build();
//! collection.add(helena.clone()).unwrap();
//! collection.add(helge).unwrap();
//!
//! let found = collection.query("text = 'Helena'").unwrap();
//! assert_eq!(found, vec![helena]);
//! ```

use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use crate::analysis::Analyzer;
use crate::config::CollectionConfig;
use crate::culture::Culture;
use crate::document::Record;
use crate::error::{Result, TesseraError};
use crate::index::{CancellationToken, IndexCatalog, ReindexProgress};
use crate::schema::Schema;
use crate::store::{DocumentStore, MemoryStore};
use crate::wql::{Executor, Registry, Statement, WqlParser};

/// A set of records of one type, indexed per field and queryable with WQL.
///
/// A collection is single-writer: mutation takes `&mut self`, so concurrent
/// readers and writers have to be serialized by the caller.
pub struct Collection<R: Record, S = MemoryStore<R>> {
    schema: Schema<R>,
    config: CollectionConfig,
    culture: Culture,
    analyzer: Arc<dyn Analyzer>,
    registry: Registry,
    catalog: IndexCatalog<R>,
    store: S,
}

impl<R: Record> Collection<R> {
    /// An empty in-memory collection with the default configuration.
    pub fn new(schema: Schema<R>) -> Result<Self> {
        Self::with_store(schema, MemoryStore::new(), CollectionConfig::default())
    }

    /// An empty in-memory collection.
    pub fn with_config(schema: Schema<R>, config: CollectionConfig) -> Result<Self> {
        Self::with_store(schema, MemoryStore::new(), config)
    }
}

impl<R: Record, S: DocumentStore<R>> Collection<R, S> {
    /// A collection over `store`. Records already in the store are indexed.
    pub fn with_store(schema: Schema<R>, store: S, config: CollectionConfig) -> Result<Self> {
        config.validate()?;
        let culture = config.culture()?;
        let analyzer = config.analyzer.build();
        let catalog =
            IndexCatalog::build(&schema, Arc::clone(&analyzer), &culture, &store.all())?;
        debug!(
            "created collection with {} field index(es) over {} record(s)",
            catalog.len(),
            store.len()
        );

        Ok(Collection {
            schema,
            config,
            culture,
            analyzer,
            registry: Registry::with_builtins(),
            catalog,
            store,
        })
    }

    pub fn schema(&self) -> &Schema<R> {
        &self.schema
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Culture used for indexing and as the default statement culture.
    pub fn culture(&self) -> &Culture {
        &self.culture
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register custom conditions and functions here.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn catalog(&self) -> &IndexCatalog<R> {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &Uuid) -> Option<R> {
        self.store.get_item(id)
    }

    /// Store and index `record`. A record with the same id is replaced and
    /// its old field values are removed from the indexes first.
    pub fn add(&mut self, record: R) -> Result<()> {
        if let Some(previous) = self.store.get_item(&record.id()) {
            self.catalog.delete(&previous)?;
        }
        self.catalog.add(&record)?;
        self.store.add(record)
    }

    /// Add every record of `records`, returning how many were added.
    pub fn add_all<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = R>,
    {
        let mut count = 0;
        for record in records {
            self.add(record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Remove the record with `id` from the store and the indexes.
    pub fn delete(&mut self, id: &Uuid) -> Result<Option<R>> {
        let removed = self.store.delete(id)?;
        if let Some(record) = &removed {
            self.catalog.delete(record)?;
        }
        Ok(removed)
    }

    /// Parse `wql` with the collection culture.
    pub fn parse(&self, wql: &str) -> Statement {
        self.parse_with_culture(wql, self.culture.clone())
    }

    /// Parse `wql`, reading numeric literals with `culture`.
    pub fn parse_with_culture(&self, wql: &str, culture: Culture) -> Statement {
        WqlParser::new(&self.registry, &self.schema)
            .with_culture(culture)
            .parse(wql)
    }

    /// Parse and apply `wql`.
    ///
    /// Unlike [`apply`](Self::apply), a malformed statement is reported as
    /// a [`TesseraError::Query`].
    pub fn query(&self, wql: &str) -> Result<Vec<R>> {
        let statement = self.parse(wql);
        if let Some(error) = statement.error() {
            return Err(TesseraError::query(format!("invalid statement '{wql}': {error}")));
        }
        self.apply(&statement)
    }

    /// Apply a statement to the whole collection.
    pub fn apply(&self, statement: &Statement) -> Result<Vec<R>> {
        self.executor().apply(statement, &self.catalog, &self.store)
    }

    /// Apply a statement to `candidates` instead of the collection.
    pub fn apply_to(&self, statement: &Statement, candidates: Vec<R>) -> Result<Vec<R>> {
        self.executor().apply_to(statement, candidates)
    }

    fn executor(&self) -> Executor<'_, R> {
        Executor::new(&self.schema, Arc::clone(&self.analyzer), &self.culture)
            .with_max_results(self.config.max_results)
    }

    /// Rebuild every index from the store.
    ///
    /// `cancel` is checked before each record and `progress` is called after
    /// each one. A cancelled re-index returns
    /// [`TesseraError::OperationCancelled`] and leaves the records processed
    /// so far indexed.
    pub fn reindex<F>(&mut self, cancel: &CancellationToken, progress: F) -> Result<usize>
    where
        F: FnMut(ReindexProgress),
    {
        let records = self.store.all();
        self.catalog.rebuild(&records, cancel, progress)
    }

    /// Like [`reindex`](Self::reindex), yielding to the tokio scheduler
    /// between records.
    pub async fn reindex_async<F>(
        &mut self,
        cancel: &CancellationToken,
        progress: F,
    ) -> Result<usize>
    where
        F: FnMut(ReindexProgress),
    {
        let records = self.store.all();
        self.catalog.rebuild_async(&records, cancel, progress).await
    }
}

impl<R: Record, S: std::fmt::Debug> std::fmt::Debug for Collection<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("store", &self.store)
            .finish()
    }
}
