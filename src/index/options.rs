//! Retrieval options shared by the term trie and the numeric tree.

use serde::{Deserialize, Serialize};

/// How a reverse index matches the searched value against stored keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RetrieveMethod {
    /// Presence of every searched term (numeric: equality).
    #[default]
    Default,
    /// Searched terms at adjacent positions, in order (numeric: equality).
    Phrase,
    /// Searched terms in order with at most `distance` positions between
    /// consecutive terms (numeric: equality).
    Proximity,
    /// Stored terms starting with the searched term (numeric: equality).
    Prefix,
    /// Stored terms within `similarity` edits of the searched term
    /// (numeric: values within `similarity` of the searched value).
    Fuzzy,
    /// Keys strictly greater than the searched value.
    GreaterThan,
    /// Keys greater than or equal to the searched value.
    GreaterThanOrEqual,
    /// Keys strictly less than the searched value.
    LessThan,
    /// Keys less than or equal to the searched value.
    LessThanOrEqual,
}

/// Options passed to `retrieve`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrieveOptions {
    /// Caps the result set size (smallest ids first).
    pub max_results: Option<usize>,
    /// Matching method.
    pub method: RetrieveMethod,
    /// Maximum positional gap for [`RetrieveMethod::Proximity`].
    pub distance: u32,
    /// Edit distance (text) or tolerance (numbers) for
    /// [`RetrieveMethod::Fuzzy`].
    pub similarity: f64,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        RetrieveOptions {
            max_results: None,
            method: RetrieveMethod::Default,
            distance: 1,
            similarity: 0.0,
        }
    }
}

impl RetrieveOptions {
    /// Options using the given method and defaults otherwise.
    pub fn method(method: RetrieveMethod) -> Self {
        RetrieveOptions {
            method,
            ..Default::default()
        }
    }

    /// Set the proximity distance.
    pub fn with_distance(mut self, distance: u32) -> Self {
        self.distance = distance;
        self
    }

    /// Set the fuzzy similarity.
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = similarity;
        self
    }

    /// Cap the number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}
