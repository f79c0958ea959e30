use std::path::PathBuf;

use thiserror::Error;
use tickerbase_warehouse::WarehouseError;

/// Validation errors raised by domain constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date '{value}', expected {expected}")]
    InvalidDate {
        value: String,
        expected: &'static str,
    },

    #[error("price point symbol '{found}' does not belong to stock '{expected}'")]
    SymbolMismatch { expected: String, found: String },
}

/// A source cell that could not be interpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{table} row {row}, column '{column}': cannot parse '{value}': {reason}")]
pub struct ParseError {
    /// Name of the table being read (`metadata` or `prices`).
    pub table: &'static str,
    /// 1-indexed row number; the header is row 1.
    pub row: u64,
    pub column: &'static str,
    pub value: String,
    pub reason: String,
}

/// Fatal ingestion errors. Nothing is written when one of these occurs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A document that could not be written. Logged and skipped.
#[derive(Debug, Error)]
#[error("failed to insert document for symbol '{symbol}': {source}")]
pub struct InsertError {
    pub symbol: String,
    #[source]
    pub source: WarehouseError,
}

/// Coarse classification of [`TraderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderErrorKind {
    NotFound,
    Decode,
    Query,
}

/// Query engine errors.
#[derive(Debug, Error)]
pub enum TraderError {
    #[error("no stock matches '{identifier}'")]
    NotFound { identifier: String },

    #[error("cannot decode stored document: {reason}")]
    Decode { reason: String },

    #[error("query failed: {0}")]
    Query(#[from] WarehouseError),
}

impl TraderError {
    pub fn kind(&self) -> TraderErrorKind {
        match self {
            Self::NotFound { .. } => TraderErrorKind::NotFound,
            Self::Decode { .. } => TraderErrorKind::Decode,
            Self::Query(_) => TraderErrorKind::Query,
        }
    }
}

impl From<serde_json::Error> for TraderError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode {
            reason: error.to_string(),
        }
    }
}
