//! Culture (locale) conventions used while parsing WQL values.
//!
//! A [`Culture`] decides how numeric literals are read: which character is
//! the decimal separator and which one groups thousands. Date values are
//! always accepted in RFC 3339 form regardless of the culture.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

/// Numeric formatting convention for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Culture {
    /// Culture name, e.g. `en-US`. Empty for the invariant culture.
    pub name: String,
    /// Character separating the integral and fractional part.
    pub decimal_separator: char,
    /// Character grouping thousands, if the culture uses one.
    pub group_separator: Option<char>,
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

impl Culture {
    /// The invariant culture: `.` as decimal separator, no grouping.
    pub fn invariant() -> Self {
        Culture {
            name: String::new(),
            decimal_separator: '.',
            group_separator: None,
        }
    }

    /// Create a custom culture.
    pub fn new<S: Into<String>>(
        name: S,
        decimal_separator: char,
        group_separator: Option<char>,
    ) -> Self {
        Culture {
            name: name.into(),
            decimal_separator,
            group_separator,
        }
    }

    /// Look up one of the known cultures by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        let culture = match name.to_ascii_lowercase().as_str() {
            "" | "invariant" => Self::invariant(),
            "en" | "en-us" | "en-gb" => Self::new(name, '.', Some(',')),
            "de" | "de-de" | "de-at" | "it-it" | "es-es" => Self::new(name, ',', Some('.')),
            "fr" | "fr-fr" => Self::new(name, ',', Some('\u{a0}')),
            "de-ch" => Self::new(name, '.', Some('\'')),
            _ => {
                return Err(TesseraError::config(format!("unknown culture '{name}'")));
            }
        };
        Ok(culture)
    }

    /// Parse a numeric literal according to this culture.
    ///
    /// Group separators are ignored, the decimal separator is mapped to `.`.
    /// Returns `None` for anything that is not a finite number.
    pub fn parse_number(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut normalized = String::with_capacity(text.len());
        for ch in text.chars() {
            if Some(ch) == self.group_separator {
                continue;
            }
            if ch == self.decimal_separator {
                normalized.push('.');
            } else if ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == 'e' || ch == 'E' {
                normalized.push(ch);
            } else {
                return None;
            }
        }

        normalized.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Parse a date value (RFC 3339 timestamp or `YYYY-MM-DD`) into Unix
    /// seconds.
    pub fn parse_datetime(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Some(timestamp_seconds(&datetime.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| timestamp_seconds(&naive.and_utc()))
    }

    /// Format a number the way this culture writes it (no grouping).
    pub fn format_number(&self, value: f64) -> String {
        let text = value.to_string();
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

/// Unix timestamp of a UTC date time with sub-second precision.
pub fn timestamp_seconds(datetime: &DateTime<Utc>) -> f64 {
    datetime.timestamp() as f64 + f64::from(datetime.timestamp_subsec_millis()) / 1000.0
}
