//! User-facing WQL errors.
//!
//! Malformed query text never aborts: the parser stores a [`WqlError`] on
//! the statement, pointing at the offending substring by character offset
//! and length.

use std::fmt;

use thiserror::Error;

/// What went wrong while lexing or parsing a WQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A quote was opened and never closed.
    UnterminatedQuote,
    /// A token appeared where it is not allowed.
    UnexpectedToken,
    /// The statement ended while more input was required.
    UnexpectedEnd,
    /// A specific token was required.
    Expected(String),
    /// The attribute is not part of the schema.
    UnknownAttribute,
    /// The attribute exists but has no reverse index.
    AttributeNotIndexed,
    /// No registered condition operator matches.
    UnknownCondition,
    /// No registered function has this name.
    UnknownFunction,
    /// A function was called with an unsupported number of arguments.
    WrongArgumentCount,
    /// A number was required.
    InvalidNumber,
    /// Parentheses, function calls or `and`/`or` chains nest too deeply.
    NestingTooDeep,
}

impl ErrorKind {
    /// Stable message key, e.g. for localisation by the caller.
    pub fn key(&self) -> &'static str {
        match self {
            ErrorKind::UnterminatedQuote => "wql.unterminated_quote",
            ErrorKind::UnexpectedToken => "wql.unexpected_token",
            ErrorKind::UnexpectedEnd => "wql.unexpected_end",
            ErrorKind::Expected(_) => "wql.expected",
            ErrorKind::UnknownAttribute => "wql.unknown_attribute",
            ErrorKind::AttributeNotIndexed => "wql.attribute_not_indexed",
            ErrorKind::UnknownCondition => "wql.unknown_condition",
            ErrorKind::UnknownFunction => "wql.unknown_function",
            ErrorKind::WrongArgumentCount => "wql.wrong_argument_count",
            ErrorKind::InvalidNumber => "wql.invalid_number",
            ErrorKind::NestingTooDeep => "wql.nesting_too_deep",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnterminatedQuote => write!(f, "unterminated quote"),
            ErrorKind::UnexpectedToken => write!(f, "unexpected token"),
            ErrorKind::UnexpectedEnd => write!(f, "unexpected end of statement"),
            ErrorKind::Expected(what) => write!(f, "expected {what}"),
            ErrorKind::UnknownAttribute => write!(f, "unknown attribute"),
            ErrorKind::AttributeNotIndexed => write!(f, "attribute is not indexed"),
            ErrorKind::UnknownCondition => write!(f, "unknown condition"),
            ErrorKind::UnknownFunction => write!(f, "unknown function"),
            ErrorKind::WrongArgumentCount => write!(f, "wrong number of arguments"),
            ErrorKind::InvalidNumber => write!(f, "invalid number"),
            ErrorKind::NestingTooDeep => write!(f, "expression nested too deeply"),
        }
    }
}

/// A parse error located in the statement text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset} (length {length}): '{text}'")]
pub struct WqlError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Character offset of the offending token.
    pub offset: usize,
    /// Length of the offending token in characters.
    pub length: usize,
    /// The offending text.
    pub text: String,
}

impl WqlError {
    /// Create a new error.
    pub fn new<S: Into<String>>(kind: ErrorKind, offset: usize, length: usize, text: S) -> Self {
        WqlError {
            kind,
            offset,
            length,
            text: text.into(),
        }
    }

    /// Message key of the error kind.
    pub fn key(&self) -> &'static str {
        self.kind.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = WqlError::new(ErrorKind::UnknownAttribute, 19, 11, "not_a_field");
        assert_eq!(
            error.to_string(),
            "unknown attribute at offset 19 (length 11): 'not_a_field'"
        );
        assert_eq!(error.key(), "wql.unknown_attribute");

        let error = WqlError::new(ErrorKind::Expected("')'".into()), 3, 0, "");
        assert_eq!(error.kind.to_string(), "expected ')'");
    }
}
