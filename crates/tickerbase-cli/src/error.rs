use thiserror::Error;
use tickerbase_core::{IngestError, TraderError, TraderErrorKind};
use tickerbase_warehouse::WarehouseError;
use tickerbase_web::WebError;

use crate::config::ConfigError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("storage error: {0}")]
    Storage(#[from] WarehouseError),

    #[error(transparent)]
    Query(#[from] TraderError),

    #[error(transparent)]
    Server(#[from] WebError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Ingest(_) => 3,
            Self::Storage(_) => 4,
            Self::Query(error) => match error.kind() {
                TraderErrorKind::NotFound => 5,
                TraderErrorKind::Decode | TraderErrorKind::Query => 4,
            },
            Self::Server(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
