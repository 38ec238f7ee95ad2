//! Table operation error types.

use thiserror::Error;

/// Errors surfaced by table operations and the upgrader.
#[derive(Debug, Error)]
pub enum TableError {
    /// The query runner reported an error before or while executing.
    #[error("query failed: {0}")]
    Query(String),

    /// Driver-level database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The query reported success but the expected observable state does
    /// not hold (e.g. the table is still absent after a create).
    #[error("postcondition failed for table {table}: {detail}")]
    Postcondition { table: String, detail: String },

    /// Sanitization collapsed an identifier to nothing.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Result type for table operations.
pub type TableResult<T> = std::result::Result<T, TableError>;
