//! Analyzer implementations that turn raw values into indexable terms.

use std::fmt::Debug;

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::Token;
use crate::culture::Culture;
use crate::error::Result;

/// Trait for analyzers that convert text into normalized tokens.
///
/// Implementations must be deterministic: indexing a value and later
/// analyzing the same value as a query parameter has to produce the same
/// terms, otherwise retrieval cannot find what was stored.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyze the given text and return its tokens in position order.
    fn analyze(&self, text: &str, culture: &Culture) -> Result<Vec<Token>>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Splits text on Unicode word boundaries (UAX #29) and lowercases every
/// word.
///
/// Segments without any alphanumeric character (punctuation, whitespace,
/// lone combining marks) are dropped, so they never reach a term index.
///
/// ```
/// use tessera::analysis::{Analyzer, StandardAnalyzer};
/// use tessera::culture::Culture;
///
/// let tokens = StandardAnalyzer::new()
///     .analyze("Hello, World!", &Culture::invariant())
///     .unwrap();
/// assert_eq!(tokens[0].text, "hello");
/// assert_eq!(tokens[1].text, "world");
/// assert_eq!(tokens[1].position, 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StandardAnalyzer;

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str, _culture: &Culture) -> Result<Vec<Token>> {
        let tokens = text
            .unicode_words()
            .filter(|word| word.chars().any(char::is_alphanumeric))
            .enumerate()
            .map(|(position, word)| Token::new(word.to_lowercase(), position as u32))
            .collect();
        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Treats the whole (trimmed, lowercased) value as a single term.
///
/// Useful for identifiers, tags and other values that must match exactly.
#[derive(Clone, Debug, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    /// Create a new keyword analyzer.
    pub fn new() -> Self {
        KeywordAnalyzer
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, text: &str, _culture: &Culture) -> Result<Vec<Token>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Token::new(trimmed.to_lowercase(), 0)])
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
