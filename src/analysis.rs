//! Text analysis for Tessera.
//!
//! Reverse indexes never normalize text themselves. Every raw string that
//! reaches a term index, whether it comes from a record or from a WQL
//! parameter, first passes through an [`Analyzer`](analyzer::Analyzer)
//! which turns it into normalized terms with integer positions.

pub mod analyzer;
pub mod token;

pub use analyzer::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
pub use token::Token;
