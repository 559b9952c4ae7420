//! Error types for statement execution.

use thiserror::Error;

/// Errors surfaced by the executor.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Database error from sqlx, propagated unchanged.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A fetched row did not contain an expected column.
    #[error("column '{0}' missing from row")]
    MissingColumn(String),

    /// A fetched value could not be decoded.
    #[error("cannot decode column '{column}' with storage type {type_name}")]
    Decode {
        /// Column name as selected.
        column: String,
        /// Reported storage type.
        type_name: String,
    },
}

/// Result type alias for executor operations.
pub type Result<T> = std::result::Result<T, SqlError>;
