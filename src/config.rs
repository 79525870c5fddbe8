//! Collection configuration.
//!
//! # Example
//!
//! ```
//! use tessera::config::{AnalyzerKind, CollectionConfig};
//!
//! let config = CollectionConfig::from_json_str(r#"{ "culture": "de-DE", "max_results": 100 }"#)
//!     .unwrap();
//! assert_eq!(config.max_results, Some(100));
//! assert_eq!(config.analyzer, AnalyzerKind::Standard);
//! assert_eq!(config.culture().unwrap().decimal_separator, ',');
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
use crate::culture::Culture;
use crate::error::{Result, TesseraError};

/// Analyzer used for text fields that do not declare their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Unicode words, lowercased.
    #[default]
    Standard,
    /// The whole value as one lowercased term.
    Keyword,
}

impl AnalyzerKind {
    /// Instantiate the analyzer.
    pub fn build(&self) -> Arc<dyn Analyzer> {
        match self {
            AnalyzerKind::Standard => Arc::new(StandardAnalyzer::new()),
            AnalyzerKind::Keyword => Arc::new(KeywordAnalyzer::new()),
        }
    }
}

/// Settings of a [`Collection`](crate::collection::Collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Culture name used for indexing and as the default statement culture.
    /// Empty means invariant.
    pub culture: String,

    /// Cap on the number of ids a single condition may match.
    pub max_results: Option<usize>,

    /// Default analyzer for text fields.
    pub analyzer: AnalyzerKind,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            culture: String::new(),
            max_results: None,
            analyzer: AnalyzerKind::Standard,
        }
    }
}

impl CollectionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the culture name.
    pub fn with_culture<S: Into<String>>(mut self, culture: S) -> Self {
        self.culture = culture.into();
        self
    }

    /// Set the per-condition result cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Set the default text analyzer.
    pub fn with_analyzer(mut self, analyzer: AnalyzerKind) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CollectionConfig = serde_json::from_str(json)
            .map_err(|e| TesseraError::config(format!("Failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        self.culture()?;
        if self.max_results == Some(0) {
            return Err(TesseraError::config("max_results must be greater than zero"));
        }
        Ok(())
    }

    /// The configured culture.
    pub fn culture(&self) -> Result<Culture> {
        Culture::from_name(&self.culture)
    }
}
