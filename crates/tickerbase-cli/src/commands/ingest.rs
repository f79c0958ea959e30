use serde::Serialize;
use tickerbase_core::{ingest_files, IngestReport};
use tickerbase_warehouse::Warehouse;

use crate::config::AppConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub run_id: String,
    pub symbols: usize,
    pub price_points: usize,
    pub inserted: Vec<String>,
    pub failed: Vec<FailedInsert>,
}

#[derive(Debug, Serialize)]
pub struct FailedInsert {
    pub symbol: String,
    pub reason: String,
}

impl From<IngestReport> for IngestSummary {
    fn from(report: IngestReport) -> Self {
        Self {
            run_id: report.run_id,
            symbols: report.symbols,
            price_points: report.price_points,
            inserted: report.inserted,
            failed: report
                .failed
                .into_iter()
                .map(|error| FailedInsert {
                    reason: error.source.to_string(),
                    symbol: error.symbol,
                })
                .collect(),
        }
    }
}

pub fn run(warehouse: &Warehouse, config: &AppConfig) -> Result<IngestSummary, CliError> {
    tracing::info!(
        metadata = %config.stock.display(),
        prices = %config.data.display(),
        store = %warehouse.location().describe(),
        "ingesting"
    );
    let report = ingest_files(warehouse, &config.stock, &config.data)?;
    Ok(IngestSummary::from(report))
}
