//! WQL functions usable as condition parameters.
//!
//! Functions are evaluated when a statement is applied, not when it is
//! parsed, so `now()` always refers to the time of the query.

use std::fmt::Debug;
use std::ops::RangeInclusive;

use chrono::{Duration, NaiveTime, Utc};

use crate::culture::{Culture, timestamp_seconds};
use crate::error::{Result, TesseraError};
use crate::wql::ast::Value;

/// A named function callable from WQL.
pub trait WqlFunction: Send + Sync + Debug {
    /// Name as written in WQL; matched case-insensitively.
    fn name(&self) -> &'static str;

    /// Accepted number of arguments, checked by the parser.
    fn arity(&self) -> RangeInclusive<usize>;

    /// Compute the function value from already evaluated arguments.
    fn evaluate(&self, arguments: &[Value], culture: &Culture) -> Result<Value>;
}

fn midnight_in_days(days: i64) -> Result<Value> {
    let date = Duration::try_days(days)
        .and_then(|offset| Utc::now().date_naive().checked_add_signed(offset))
        .ok_or_else(|| TesseraError::query(format!("day offset {days} is out of range")))?;
    Ok(Value::Number(timestamp_seconds(
        &date.and_time(NaiveTime::MIN).and_utc(),
    )))
}

/// `now()`: the current UTC time in Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Now;

impl WqlFunction for Now {
    fn name(&self) -> &'static str {
        "now"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn evaluate(&self, _arguments: &[Value], _culture: &Culture) -> Result<Value> {
        Ok(Value::Number(timestamp_seconds(&Utc::now())))
    }
}

/// `today()`: midnight (UTC) of the current day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Today;

impl WqlFunction for Today {
    fn name(&self) -> &'static str {
        "today"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn evaluate(&self, _arguments: &[Value], _culture: &Culture) -> Result<Value> {
        midnight_in_days(0)
    }
}

/// `day(n)`: midnight (UTC) `n` days from today; `n` may be negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct Day;

impl WqlFunction for Day {
    fn name(&self) -> &'static str {
        "day"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn evaluate(&self, arguments: &[Value], culture: &Culture) -> Result<Value> {
        let offset = arguments
            .first()
            .and_then(|argument| argument.as_number(culture))
            .filter(|n| n.fract() == 0.0)
            .ok_or_else(|| TesseraError::query("day() expects a whole number of days"))?;
        // `as` saturates, so out-of-range offsets are rejected first
        if !(i64::MIN as f64..i64::MAX as f64).contains(&offset) {
            return Err(TesseraError::query(format!("day offset {offset} is out of range")));
        }
        midnight_in_days(offset as i64)
    }
}

/// `lower(text)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Lower;

impl WqlFunction for Lower {
    fn name(&self) -> &'static str {
        "lower"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn evaluate(&self, arguments: &[Value], _culture: &Culture) -> Result<Value> {
        let text = arguments
            .first()
            .map(Value::to_index_text)
            .unwrap_or_default();
        Ok(Value::Text(text.to_lowercase()))
    }
}

/// `upper(text)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Upper;

impl WqlFunction for Upper {
    fn name(&self) -> &'static str {
        "upper"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn evaluate(&self, arguments: &[Value], _culture: &Culture) -> Result<Value> {
        let text = arguments
            .first()
            .map(Value::to_index_text)
            .unwrap_or_default();
        Ok(Value::Text(text.to_uppercase()))
    }
}
