//! WQL, the query language of a collection.
//!
//! A statement goes through four stages:
//!
//! 1. [`lexer::tokenize`] splits the text into located tokens
//! 2. [`parser::WqlParser`] builds a [`Statement`] holding the expression
//!    tree, consulting a [`Registry`] for operators and functions
//! 3. [`executor::Executor`] evaluates the filter as set algebra over
//!    reverse indexes
//! 4. the executor orders and partitions the materialized records
//!
//! # Examples
//!
//! ```
//! use tessera::schema::{FieldDescriptor, FieldType, Schema};
//! use tessera::document::Document;
//! use tessera::wql::{Registry, WqlParser};
//!
//! let schema: Schema<Document> = Schema::new()
//!     .with_field(FieldDescriptor::path("title", FieldType::Text))
//!     .unwrap();
//! let registry = Registry::with_builtins();
//!
//! let statement = WqlParser::new(&registry, &schema).parse("TITLE = hello take 10");
//! assert!(!statement.has_errors());
//! assert_eq!(statement.to_string(), "TITLE = 'hello' take 10");
//! ```

pub mod ast;
pub mod condition;
pub mod error;
pub mod executor;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod statement;

pub use ast::{Filter, Order, Partitioning, Value};
pub use condition::{ConditionKind, ConditionOperator, ConditionOptions};
pub use error::{ErrorKind, WqlError};
pub use executor::Executor;
pub use function::WqlFunction;
pub use lexer::{QueryToken, TokenKind, tokenize};
pub use parser::WqlParser;
pub use registry::Registry;
pub use statement::Statement;
