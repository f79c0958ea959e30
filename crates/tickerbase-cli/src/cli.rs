//! CLI argument definitions for tickerbase.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Merge the metadata and price CSVs into stored documents |
//! | `find` | Price points of a stock, by symbol or company name |
//! | `list` | Stocks among the given tickers trading within a window |
//! | `top` | Best (or worst) performers of a window |
//! | `serve` | Run the HTTP API |
//!
//! # Settings
//!
//! Settings come either from a JSON file (`--config <file>`) or from the
//! flags below; when `--config` is given the flags are ignored.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--app-port` | `9000` | HTTP port |
//! | `--api-key` | empty | Key required in the `API-KEY` header (empty disables) |
//! | `--db-path` | empty | DuckDB file (empty keeps the store in memory) |
//! | `--log-path` | empty | Directory for `tickerbase.log` (empty logs to stderr) |
//! | `--log-level` | `info` | error, warn, info, debug, trace |
//! | `--stock` | `data/stock.csv` | Metadata CSV |
//! | `--data` | `data/data.csv` | Price CSV |
//!
//! # Examples
//!
//! ```bash
//! # Load both CSVs into a file-backed store
//! tickerbase --db-path data/tickerbase.duckdb ingest
//!
//! # Compare two tickers over Q1
//! tickerbase --db-path data/tickerbase.duckdb list --ticker AAPL --ticker MSFT \
//!     --from 2020-01-01 --to 2020-03-31 --pretty
//!
//! # Serve from a config file
//! tickerbase --config config.json serve
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tickerbase_core::{TradeDate, ValidationError};

/// Stock time-series store with lookup, listing and ranking queries.
#[derive(Debug, Parser)]
#[command(
    name = "tickerbase",
    author,
    version,
    about = "Stock time-series store with lookup, listing and ranking queries"
)]
pub struct Cli {
    /// Read settings from a JSON file instead of flags.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Flag form of the application settings.
#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Port the HTTP API listens on.
    #[arg(long, global = true, default_value = "9000")]
    pub app_port: String,

    /// Key clients must send in the `API-KEY` header.
    #[arg(long, global = true, default_value = "")]
    pub api_key: String,

    /// DuckDB database file.
    #[arg(long, global = true, default_value = "")]
    pub db_path: String,

    /// Directory receiving `tickerbase.log`.
    #[arg(long, global = true, default_value = "")]
    pub log_path: String,

    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Metadata CSV (symbol, name, marketCap, sector, industry).
    #[arg(long, global = true, default_value = "data/stock.csv")]
    pub stock: String,

    /// Price CSV (date, symbol, open, close, low, high, volume).
    #[arg(long, global = true, default_value = "data/data.csv")]
    pub data: String,

    /// Upper bound for opening the store, in milliseconds.
    #[arg(long, global = true, default_value_t = 20_000)]
    pub connect_timeout_ms: u64,

    /// Upper bound for reading a query result, in milliseconds.
    #[arg(long, global = true, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge the metadata and price CSVs and store one document per ticker.
    ///
    /// Every run inserts new documents; running twice stores each ticker twice.
    Ingest,

    /// Price points of the first stock whose symbol or name matches exactly.
    Find(FindArgs),

    /// Stocks among the given tickers with a price point inside the window.
    List(ListArgs),

    /// Up to ten symbols ranked by summed close-minus-open inside the window.
    Top(TopArgs),

    /// Serve the HTTP API.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Ticker symbol or company name.
    pub identifier: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Ticker to include; repeat for several.
    #[arg(long = "ticker")]
    pub tickers: Vec<String>,

    /// First day of the window (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub from: TradeDate,

    /// Last day of the window (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub to: TradeDate,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// First day of the window (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub from: TradeDate,

    /// Last day of the window (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub to: TradeDate,

    /// Rank worst performers first.
    #[arg(long, default_value_t = false)]
    pub worst: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Ingest the configured CSVs before serving.
    ///
    /// Needed when the store is in memory.
    #[arg(long, default_value_t = false)]
    pub ingest: bool,
}

fn parse_date(value: &str) -> Result<TradeDate, ValidationError> {
    TradeDate::parse(value)
}
