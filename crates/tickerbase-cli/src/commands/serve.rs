use std::sync::Arc;

use tickerbase_core::StockTrader;
use tickerbase_warehouse::{StorageLocation, Warehouse};
use tickerbase_web::AppState;

use crate::cli::ServeArgs;
use crate::commands::ingest;
use crate::config::AppConfig;
use crate::error::CliError;

pub async fn run(warehouse: Warehouse, config: &AppConfig, args: &ServeArgs) -> Result<(), CliError> {
    if args.ingest {
        let summary = ingest::run(&warehouse, config)?;
        tracing::info!(
            run_id = %summary.run_id,
            inserted = summary.inserted.len(),
            failed = summary.failed.len(),
            "store populated"
        );
    } else if *warehouse.location() == StorageLocation::InMemory {
        tracing::warn!("serving an empty in-memory store; pass --ingest or --db-path");
    }

    if config.api_key.is_empty() {
        tracing::warn!("no api key configured, stock routes are open");
    }

    let trader = StockTrader::new(warehouse);
    let state = AppState::new(Arc::new(trader), &config.api_key, env!("CARGO_PKG_VERSION"));
    tickerbase_web::serve(state, config.app_port).await?;
    Ok(())
}
