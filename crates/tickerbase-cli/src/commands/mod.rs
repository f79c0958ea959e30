mod ingest;
mod query;
mod serve;

use std::process::ExitCode;

use tickerbase_core::StockTrader;
use tickerbase_warehouse::{StorageLocation, Warehouse};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::CliError;
use crate::output;

/// Exit code of an ingestion run that skipped some documents.
const PARTIAL_INGEST_EXIT: u8 = 3;

pub async fn run(cli: &Cli, config: &AppConfig) -> Result<ExitCode, CliError> {
    let warehouse = Warehouse::open(config.warehouse_config())?;
    if queries_fresh_store(&cli.command, warehouse.location()) {
        tracing::warn!("querying a fresh in-memory store; pass --db-path to read ingested documents");
    }

    match &cli.command {
        Command::Ingest => {
            let summary = ingest::run(&warehouse, config)?;
            let complete = summary.failed.is_empty();
            output::render(&summary, cli.pretty)?;
            if !complete {
                return Ok(ExitCode::from(PARTIAL_INGEST_EXIT));
            }
        }
        Command::Find(args) => {
            let trader = StockTrader::new(warehouse);
            output::render(query::find(&trader, args)?, cli.pretty)?;
        }
        Command::List(args) => {
            let trader = StockTrader::new(warehouse);
            output::render(query::list(&trader, args)?, cli.pretty)?;
        }
        Command::Top(args) => {
            let trader = StockTrader::new(warehouse);
            output::render(query::top(&trader, args)?, cli.pretty)?;
        }
        Command::Serve(args) => serve::run(warehouse, config, args).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Query commands against an in-memory store only ever see an empty database.
fn queries_fresh_store(command: &Command, location: &StorageLocation) -> bool {
    matches!(command, Command::Find(_) | Command::List(_) | Command::Top(_))
        && *location == StorageLocation::InMemory
}
