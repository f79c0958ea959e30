use thiserror::Error;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store could not be opened.
    #[error("could not establish connection to {location}: {source}")]
    Connect {
        location: String,
        #[source]
        source: ::duckdb::Error,
    },

    /// Opening the store took longer than the setup timeout.
    #[error("connection to {location} not established within {timeout_ms}ms")]
    ConnectTimeout { location: String, timeout_ms: u64 },

    /// Request was rejected before reaching the database.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Query execution timed out.
    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },
}
