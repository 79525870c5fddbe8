//! A parsed WQL statement.

use std::fmt;

use crate::culture::Culture;
use crate::wql::ast::{Filter, Order, Partitioning};
use crate::wql::error::WqlError;

/// The result of parsing a WQL string.
///
/// Parsing never fails: a malformed statement keeps its raw text and
/// carries a [`WqlError`] instead of an expression tree. Applying such a
/// statement yields no records.
#[derive(Debug, Clone)]
pub struct Statement {
    raw: String,
    filter: Option<Filter>,
    order: Option<Order>,
    partitioning: Option<Partitioning>,
    error: Option<WqlError>,
    culture: Culture,
}

impl Statement {
    pub(crate) fn parsed(
        raw: &str,
        culture: Culture,
        filter: Option<Filter>,
        order: Option<Order>,
        partitioning: Option<Partitioning>,
    ) -> Self {
        Statement {
            raw: raw.to_string(),
            filter,
            order,
            partitioning,
            error: None,
            culture,
        }
    }

    pub(crate) fn failed(raw: &str, culture: Culture, error: WqlError) -> Self {
        Statement {
            raw: raw.to_string(),
            filter: None,
            order: None,
            partitioning: None,
            error: Some(error),
            culture,
        }
    }

    /// The statement text as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn partitioning(&self) -> Option<&Partitioning> {
        self.partitioning.as_ref()
    }

    /// The parse error, if any.
    pub fn error(&self) -> Option<&WqlError> {
        self.error.as_ref()
    }

    /// Whether parsing failed.
    pub fn has_errors(&self) -> bool {
        self.error.is_some()
    }

    /// Culture used for numeric literals and function arguments.
    pub fn culture(&self) -> &Culture {
        &self.culture
    }
}

/// Canonical WQL for a successfully parsed statement, or the raw text of a
/// failed one.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_errors() {
            return f.write_str(&self.raw);
        }

        let mut parts = Vec::new();
        if let Some(filter) = &self.filter {
            parts.push(filter.to_string());
        }
        if let Some(order) = &self.order {
            parts.push(order.to_string());
        }
        if let Some(partitioning) = &self.partitioning {
            parts.push(partitioning.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}
