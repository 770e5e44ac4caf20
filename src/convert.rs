//! Conversions between in-memory values and column-native values.

use std::fmt;

use rusqlite::types::{Type, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A span of whole years, the only unit the age range of a set uses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    years: i32,
}

impl Period {
    pub const fn of_years(years: i32) -> Self {
        Self { years }
    }

    pub fn years(&self) -> i32 {
        self.years
    }
}

/// ISO-8601 form, e.g. `P12Y`.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}Y", self.years)
    }
}

/// Column value for an optional period. An absent period is stored as 0.
pub fn to_years(period: Option<Period>) -> i32 {
    period.map_or(0, |p| p.years())
}

/// Period for a stored year count. Never absent, 0 becomes `P0Y`.
pub fn from_years(years: i32) -> Period {
    Period::of_years(years)
}

/// Failure turning a stored value into its in-memory form. Not retried.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to convert large text to string: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    #[error("Expected large text, found a {0} value")]
    UnexpectedType(Type),
}

/// Reads a large-text column (TEXT or BLOB storage) into a string.
///
/// Zero-length and NULL values become an empty string.
pub fn to_text(value: ValueRef<'_>) -> Result<String, ConversionError> {
    let bytes = match value {
        ValueRef::Null => return Ok(String::new()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes,
        other => return Err(ConversionError::UnexpectedType(other.data_type())),
    };
    if bytes.is_empty() {
        return Ok(String::new());
    }
    Ok(std::str::from_utf8(bytes)?.to_owned())
}
