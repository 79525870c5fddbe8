//! In-memory reverse indexes.
//!
//! - [`trie::TermTrie`] maps analyzed terms to positional postings
//! - [`numeric::NumericTree`] maps numeric values to postings
//! - [`field::FieldIndex`] binds one of them to a field of a record type
//! - [`catalog::IndexCatalog`] holds the field indexes of a collection
//!
//! Retrieval results are [`IdSet`]s: ordered sets of record ids, so every
//! set operation and every materialization order is deterministic.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::Result;
use crate::wql::ast::Value;

pub mod catalog;
pub mod field;
pub mod numeric;
pub mod options;
pub mod posting;
pub mod reindex;
pub mod trie;

pub use catalog::IndexCatalog;
pub use field::FieldIndex;
pub use numeric::NumericTree;
pub use options::{RetrieveMethod, RetrieveOptions};
pub use posting::{Posting, Postings};
pub use reindex::{CancellationToken, ReindexProgress};
pub use trie::{TermTrie, TrieStats};

/// An ordered set of record identifiers.
pub type IdSet = BTreeSet<Uuid>;

/// A reverse index as seen by condition operators.
///
/// Condition operators only ever talk to this trait, which keeps them
/// independent of the record type and of whether the index covers the
/// whole collection or just a candidate sequence.
pub trait Lookup {
    /// Name of the field this lookup indexes.
    fn field_name(&self) -> &str;

    /// Records whose value matches `value` under `options`.
    fn retrieve(&self, value: &Value, options: &RetrieveOptions) -> Result<IdSet>;

    /// Every record holding at least one indexed key for this field.
    fn all(&self) -> IdSet;

    /// Whether keys are numbers rather than analyzed terms.
    fn is_numeric(&self) -> bool {
        false
    }
}

/// Resolves WQL attribute names to lookups.
pub trait IndexSource {
    /// Find the lookup for `attribute`, failing for unknown fields.
    fn lookup(&self, attribute: &str) -> Result<&dyn Lookup>;
}

/// Keep only the `max_results` smallest ids.
pub(crate) fn cap_results(mut ids: IdSet, max_results: Option<usize>) -> IdSet {
    if let Some(max) = max_results {
        if ids.len() > max {
            ids = ids.into_iter().take(max).collect();
        }
    }
    ids
}
