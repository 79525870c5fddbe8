//! # Tessera
//!
//! An embeddable indexing engine for arbitrary record types, queried with
//! WQL.
//!
//! ## Features
//!
//! - Per-field reverse indexes: a character trie with positional postings
//!   for text, an AVL tree for numbers, booleans and dates
//! - Phrase, proximity, prefix, fuzzy and range retrieval
//! - WQL: filters with `and`/`or`, ordering and skip/take pagination
//! - Extensible registry of condition operators and functions
//! - Cancellable re-indexing with progress reporting
//!
//! ## Example
//!
//! ```
//! use tessera::prelude::*;
//!
//! let schema = Schema::new()
//!     .with_field(FieldDescriptor::path("title", FieldType::Text))?
//!     .with_field(FieldDescriptor::path("year", FieldType::Integer))?;
//! let mut books = Collection::new(schema)?;
//!
//! books.add(Document::builder().add_text("title", "Rust in Action").add_integer("year", 2021).build())?;
//! books.add(Document::builder().add_text("title", "Programming Rust").add_integer("year", 2017).build())?;
//!
//! let found = books.query("title like rus and year > 2020")?;
//! assert_eq!(found.len(), 1);
//! # Ok::<(), tessera::error::TesseraError>(())
//! ```

pub mod analysis;
pub mod collection;
pub mod config;
pub mod culture;
pub mod document;
pub mod error;
pub mod index;
pub mod schema;
pub mod store;
pub mod wql;

pub mod prelude {
    pub use crate::analysis::{Analyzer, KeywordAnalyzer, StandardAnalyzer, Token};
    pub use crate::collection::Collection;
    pub use crate::config::{AnalyzerKind, CollectionConfig};
    pub use crate::culture::Culture;
    pub use crate::document::{Document, FieldValue, Record};
    pub use crate::error::{Result, TesseraError};
    pub use crate::index::{CancellationToken, IdSet, ReindexProgress, RetrieveMethod, RetrieveOptions};
    pub use crate::schema::{FieldDescriptor, FieldType, Schema};
    pub use crate::store::{DocumentStore, MemoryStore};
    pub use crate::wql::{Registry, Statement, WqlError};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
