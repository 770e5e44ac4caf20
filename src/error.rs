use thiserror::Error;

use crate::convert::ConversionError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An update matched no row: the aggregate was deleted or never inserted.
    #[error("{entity} with id {id} does not exist")]
    Stale { entity: &'static str, id: i64 },

    #[error("{entity} has no id after pre-save hooks ran")]
    MissingId { entity: &'static str },

    #[error("Invalid value in {column}: {value}")]
    InvalidValue { column: String, value: String },
}
