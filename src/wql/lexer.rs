//! WQL tokenizer.
//!
//! A single left-to-right scan over the characters of the statement:
//!
//! - whitespace separates tokens, runs of it collapse
//! - `(`, `)` and `,` are always single-character tokens
//! - the operator characters `= ~ < > ! %` accumulate greedily, so `>=`
//!   and `!=` are one token
//! - a quoted span yields three tokens: opening quote, verbatim content
//!   (possibly empty), closing quote
//! - everything else accumulates into word tokens
//!
//! Offsets and lengths are counted in characters.

use std::collections::VecDeque;
use std::fmt;

use crate::wql::error::{ErrorKind, WqlError};

/// Classification of a query token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword, bare value or number.
    Word,
    /// Run of operator characters.
    Operator,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// Opening or closing quote character.
    Quote,
    /// Verbatim content between two quotes.
    Quoted,
}

/// A lexed token with its location in the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    /// Raw text.
    pub text: String,
    /// Character offset in the statement.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
    /// Token classification.
    pub kind: TokenKind,
}

impl QueryToken {
    fn new(text: String, offset: usize, kind: TokenKind) -> Self {
        let length = text.chars().count();
        QueryToken {
            text,
            offset,
            length,
            kind,
        }
    }

    /// Case-insensitive comparison against a keyword.
    pub fn is(&self, keyword: &str) -> bool {
        self.kind != TokenKind::Quoted && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Build an error located at this token.
    pub fn error(&self, kind: ErrorKind) -> WqlError {
        WqlError::new(kind, self.offset, self.length, self.text.clone())
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether `ch` is one of the characters operators are built from.
pub fn is_operator_char(ch: char) -> bool {
    matches!(ch, '=' | '~' | '<' | '>' | '!' | '%')
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

fn is_single(ch: char) -> Option<TokenKind> {
    match ch {
        '(' => Some(TokenKind::OpenParen),
        ')' => Some(TokenKind::CloseParen),
        ',' => Some(TokenKind::Comma),
        _ => None,
    }
}

/// Lex a statement into an ordered queue of tokens.
pub fn tokenize(input: &str) -> Result<VecDeque<QueryToken>, WqlError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = VecDeque::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        if let Some(kind) = is_single(ch) {
            tokens.push_back(QueryToken::new(ch.to_string(), pos, kind));
            pos += 1;
            continue;
        }

        if is_quote(ch) {
            let start = pos;
            let Some(close) = chars[start + 1..].iter().position(|&c| c == ch) else {
                return Err(WqlError::new(
                    ErrorKind::UnterminatedQuote,
                    start,
                    chars.len() - start,
                    chars[start..].iter().collect::<String>(),
                ));
            };
            let close = start + 1 + close;
            tokens.push_back(QueryToken::new(ch.to_string(), start, TokenKind::Quote));
            tokens.push_back(QueryToken::new(
                chars[start + 1..close].iter().collect(),
                start + 1,
                TokenKind::Quoted,
            ));
            tokens.push_back(QueryToken::new(ch.to_string(), close, TokenKind::Quote));
            pos = close + 1;
            continue;
        }

        let start = pos;
        if is_operator_char(ch) {
            while pos < chars.len() && is_operator_char(chars[pos]) {
                pos += 1;
            }
            tokens.push_back(QueryToken::new(
                chars[start..pos].iter().collect(),
                start,
                TokenKind::Operator,
            ));
            continue;
        }

        while pos < chars.len() {
            let c = chars[pos];
            if c.is_whitespace() || is_single(c).is_some() || is_quote(c) || is_operator_char(c) {
                break;
            }
            pos += 1;
        }
        tokens.push_back(QueryToken::new(
            chars[start..pos].iter().collect(),
            start,
            TokenKind::Word,
        ));
    }

    Ok(tokens)
}
