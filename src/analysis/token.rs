//! Token type produced by analyzers.
//!
//! A [`Token`] is a normalized term together with its position in the
//! source value. Positions are what phrase and proximity retrieval compare,
//! so analyzers must number tokens in source order starting at 0.
//!
//! ```
//! use tessera::analysis::token::Token;
//!
//! let token = Token::new("hello", 0);
//! assert_eq!(token.text, "hello");
//! assert_eq!(token.position, 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single normalized term and the position it occurred at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// The normalized text of the token
    pub text: String,

    /// The position of the token in the original value (0-based)
    pub position: u32,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }

    /// Get the length of the token text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.text, self.position)
    }
}

/// Build a token list from bare words, numbering positions from 0.
pub fn tokens_from_words<I, S>(words: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    words
        .into_iter()
        .enumerate()
        .map(|(position, word)| Token::new(word, position as u32))
        .collect()
}
