//! Error types for the Tessera library.
//!
//! Programmer-facing failures (wiring up a collection, registering
//! conditions, loading configuration) are represented by the
//! [`TesseraError`] enum. Malformed WQL text is *not* reported through this
//! type: the parser records it on the statement as a
//! [`WqlError`](crate::wql::WqlError) instead.
//!
//! # Examples
//!
//! ```
//! use tessera::error::{TesseraError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TesseraError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Tessera operations.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// I/O errors (reading configuration files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Schema-related errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Retrieval or lookup against a field that is not part of the schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Query-related errors raised while evaluating a statement
    #[error("Query error: {0}")]
    Query(String),

    /// A condition operator or function name registered twice
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation cancelled
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TesseraError.
pub type Result<T> = std::result::Result<T, TesseraError>;

impl TesseraError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        TesseraError::Index(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        TesseraError::Schema(msg.into())
    }

    /// Create a new unknown field error.
    pub fn unknown_field<S: Into<String>>(name: S) -> Self {
        TesseraError::UnknownField(name.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        TesseraError::Query(msg.into())
    }

    /// Create a new duplicate registration error.
    pub fn duplicate<S: Into<String>>(what: S) -> Self {
        TesseraError::DuplicateRegistration(what.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TesseraError::Config(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TesseraError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        TesseraError::OperationCancelled(msg.into())
    }

    /// Whether this error reports a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TesseraError::OperationCancelled(_))
    }
}
