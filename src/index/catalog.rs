//! The set of field indexes of a collection.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, info, warn};

use crate::analysis::{Analyzer, KeywordAnalyzer};
use crate::culture::Culture;
use crate::document::Record;
use crate::error::{Result, TesseraError};
use crate::index::field::FieldIndex;
use crate::index::reindex::{CancellationToken, ReindexProgress};
use crate::index::{IndexSource, Lookup};
use crate::schema::{FieldType, Schema};

/// Maps attribute names to the reverse index of every indexed field.
pub struct IndexCatalog<R> {
    indexes: Vec<FieldIndex<R>>,
    by_name: AHashMap<String, usize>,
}

impl<R: Record> IndexCatalog<R> {
    /// Create empty indexes for every indexed field of `schema`.
    ///
    /// Text fields use their own analyzer or `default_analyzer`, keyword
    /// fields use their own analyzer or a [`KeywordAnalyzer`].
    pub fn new(schema: &Schema<R>, default_analyzer: Arc<dyn Analyzer>, culture: &Culture) -> Self {
        let mut indexes = Vec::new();
        let mut by_name = AHashMap::new();

        for descriptor in schema.indexed_fields() {
            let analyzer = match (descriptor.analyzer(), descriptor.field_type()) {
                (Some(analyzer), _) => Arc::clone(analyzer),
                (None, FieldType::Keyword) => Arc::new(KeywordAnalyzer::new()) as Arc<dyn Analyzer>,
                (None, _) => Arc::clone(&default_analyzer),
            };
            by_name.insert(descriptor.name().to_lowercase(), indexes.len());
            indexes.push(FieldIndex::new(descriptor.clone(), analyzer, culture.clone()));
        }

        IndexCatalog { indexes, by_name }
    }

    /// Build indexes over `records` in one go.
    pub fn build<'a, I>(
        schema: &Schema<R>,
        default_analyzer: Arc<dyn Analyzer>,
        culture: &Culture,
        records: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a R>,
    {
        let mut catalog = Self::new(schema, default_analyzer, culture);
        for record in records {
            catalog.add(record)?;
        }
        Ok(catalog)
    }

    /// Index `record` in every field index.
    pub fn add(&mut self, record: &R) -> Result<()> {
        for index in &mut self.indexes {
            index.add(record)?;
        }
        Ok(())
    }

    /// Remove `record` from every field index.
    pub fn delete(&mut self, record: &R) -> Result<()> {
        for index in &mut self.indexes {
            index.delete(record)?;
        }
        Ok(())
    }

    /// Empty every field index.
    pub fn clear(&mut self) {
        for index in &mut self.indexes {
            index.clear();
        }
    }

    /// Field index for `name`.
    pub fn get(&self, name: &str) -> Result<&FieldIndex<R>> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&slot| &self.indexes[slot])
            .ok_or_else(|| TesseraError::unknown_field(name))
    }

    /// Mutable field index for `name`.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut FieldIndex<R>> {
        match self.by_name.get(&name.to_lowercase()) {
            Some(&slot) => Ok(&mut self.indexes[slot]),
            None => Err(TesseraError::unknown_field(name)),
        }
    }

    /// All field indexes in schema order.
    pub fn indexes(&self) -> &[FieldIndex<R>] {
        &self.indexes
    }

    /// Number of field indexes.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Whether no field is indexed.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Clear every index and index `records` again, one record at a time.
    ///
    /// `cancel` is checked before each record and `progress` is called after
    /// each one. On cancellation the indexes keep the prefix of `records`
    /// that was already processed and an
    /// [`OperationCancelled`](TesseraError::OperationCancelled) error is
    /// returned. Returns the number of indexed records.
    pub fn rebuild<F>(
        &mut self,
        records: &[R],
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<usize>
    where
        F: FnMut(ReindexProgress),
    {
        let total = self.start_rebuild(records.len());
        for (processed, record) in records.iter().enumerate() {
            self.rebuild_step(record, processed, total, cancel, &mut progress)?;
        }
        debug!("re-indexing finished: {total} record(s)");
        Ok(total)
    }

    /// Like [`rebuild`](Self::rebuild), yielding to the tokio scheduler
    /// after every record.
    pub async fn rebuild_async<F>(
        &mut self,
        records: &[R],
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<usize>
    where
        F: FnMut(ReindexProgress),
    {
        let total = self.start_rebuild(records.len());
        for (processed, record) in records.iter().enumerate() {
            self.rebuild_step(record, processed, total, cancel, &mut progress)?;
            tokio::task::yield_now().await;
        }
        debug!("asynchronous re-indexing finished: {total} record(s)");
        Ok(total)
    }

    fn start_rebuild(&mut self, total: usize) -> usize {
        info!("re-indexing {total} record(s) into {} field index(es)", self.len());
        self.clear();
        total
    }

    /// Index the record at position `processed`, unless cancellation was
    /// requested before it.
    fn rebuild_step<F>(
        &mut self,
        record: &R,
        processed: usize,
        total: usize,
        cancel: &CancellationToken,
        progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(ReindexProgress),
    {
        if cancel.is_cancelled() {
            warn!("re-indexing cancelled after {processed} of {total} record(s)");
            return Err(TesseraError::cancelled(format!(
                "re-indexing stopped after {processed} of {total} records"
            )));
        }
        self.add(record)?;
        progress(ReindexProgress {
            processed: processed + 1,
            total,
        });
        Ok(())
    }
}

impl<R: Record> IndexSource for IndexCatalog<R> {
    fn lookup(&self, attribute: &str) -> Result<&dyn Lookup> {
        self.get(attribute).map(|index| index as &dyn Lookup)
    }
}

impl<R> std::fmt::Debug for IndexCatalog<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCatalog")
            .field("indexes", &self.indexes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;
    use crate::document::Document;
    use crate::index::options::RetrieveOptions;
    use crate::index::IdSet;
    use crate::schema::FieldDescriptor;
    use crate::wql::ast::Value;

    fn schema() -> Schema<Document> {
        Schema::new()
            .with_field(FieldDescriptor::path("title", FieldType::Text))
            .unwrap()
            .with_field(FieldDescriptor::path("city", FieldType::Keyword))
            .unwrap()
            .with_field(FieldDescriptor::path("notes", FieldType::Text).indexed(false))
            .unwrap()
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::builder()
                .add_text("title", "Hello Helena")
                .add_text("city", "New York")
                .build(),
            Document::builder()
                .add_text("title", "Hello Helge")
                .add_text("city", "York")
                .build(),
            Document::builder().add_text("title", "Goodbye").build(),
        ]
    }

    #[test]
    fn test_catalog_lookup() {
        let docs = docs();
        let catalog = IndexCatalog::build(
            &schema(),
            Arc::new(StandardAnalyzer::new()),
            &Culture::invariant(),
            &docs,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("notes").is_err());
        assert!(catalog.lookup("missing").is_err());

        // keyword fields match the whole value only
        let city = catalog.lookup("CITY").unwrap();
        let found = city
            .retrieve(&Value::Text("york".into()), &RetrieveOptions::default())
            .unwrap();
        assert_eq!(found, IdSet::from([docs[1].id()]));
    }

    #[test]
    fn test_rebuild_cancellation_keeps_prefix() {
        let docs = docs();
        let mut catalog = IndexCatalog::new(
            &schema(),
            Arc::new(StandardAnalyzer::new()),
            &Culture::invariant(),
        );

        let cancel = CancellationToken::new();
        let observer = cancel.clone();
        let mut seen = Vec::new();
        let result = catalog.rebuild(&docs, &cancel, |progress| {
            seen.push(progress.processed);
            if progress.processed == 2 {
                observer.cancel();
            }
        });

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(seen, vec![1, 2]);

        let title = catalog.lookup("title").unwrap();
        assert_eq!(title.all(), IdSet::from([docs[0].id(), docs[1].id()]));
        let found = title
            .retrieve(&Value::Text("helge".into()), &RetrieveOptions::default())
            .unwrap();
        assert_eq!(found, IdSet::from([docs[1].id()]));
    }

    #[test]
    fn test_rebuild_complete() {
        let docs = docs();
        let mut catalog = IndexCatalog::new(
            &schema(),
            Arc::new(StandardAnalyzer::new()),
            &Culture::invariant(),
        );
        let indexed = catalog
            .rebuild(&docs, &CancellationToken::new(), |_| {})
            .unwrap();
        assert_eq!(indexed, 3);
        assert_eq!(catalog.lookup("title").unwrap().all().len(), 3);

        catalog.delete(&docs[2]).unwrap();
        assert_eq!(catalog.lookup("title").unwrap().all().len(), 2);
    }

    #[tokio::test]
    async fn test_async_rebuild_matches_sync_rebuild() {
        let docs = docs();
        let new_catalog = || {
            IndexCatalog::new(
                &schema(),
                Arc::new(StandardAnalyzer::new()),
                &Culture::invariant(),
            )
        };

        for stop_after in [1, 2, 4] {
            let mut sync_catalog = new_catalog();
            let cancel = CancellationToken::new();
            let sync_result = sync_catalog.rebuild(&docs, &cancel, |p| {
                if p.processed == stop_after {
                    cancel.cancel();
                }
            });

            let mut async_catalog = new_catalog();
            let cancel = CancellationToken::new();
            let async_result = async_catalog
                .rebuild_async(&docs, &cancel, |p| {
                    if p.processed == stop_after {
                        cancel.cancel();
                    }
                })
                .await;

            assert_eq!(sync_result.is_ok(), async_result.is_ok());
            assert_eq!(
                sync_catalog.lookup("title").unwrap().all(),
                async_catalog.lookup("title").unwrap().all()
            );
        }
    }
}
