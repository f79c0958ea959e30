//! # Tickerbase Core
//!
//! Stock records, their ingestion and the queries served over them.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | `Stock`, `PricePoint` and `TradeDate` |
//! | [`error`] | Parse, insert, validation and query errors |
//! | [`ingest`] | Merges the metadata and price tables into stored documents |
//! | [`trader`] | Point lookup, range listing and performer ranking |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tickerbase_core::{ingest_files, StockTrader, TradeDate, Trader};
//! use tickerbase_warehouse::Warehouse;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_in_memory()?;
//!     let report = ingest_files(&warehouse, Path::new("data/stock.csv"), Path::new("data/data.csv"))?;
//!     println!("inserted {} stocks", report.inserted.len());
//!
//!     let trader = StockTrader::new(warehouse);
//!     let best = trader.top(TradeDate::parse("2020-01-01")?, TradeDate::parse("2020-12-31")?, true)?;
//!     println!("{best:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐
//! │ metadata csv  │   │  prices csv   │
//! └───────┬───────┘   └───────┬───────┘
//!         └─────────┬─────────┘
//!                   ▼
//!           ┌───────────────┐
//!           │   StockBook   │  ingest
//!           └───────┬───────┘
//!                   ▼
//!           ┌───────────────┐
//!           │   Warehouse   │  DuckDB
//!           └───────┬───────┘
//!                   ▼
//!           ┌───────────────┐
//!           │  StockTrader  │  find / find_all / top
//!           └───────────────┘
//! ```

pub mod domain;
pub mod error;
pub mod ingest;
pub mod trader;

pub use domain::{PricePoint, Stock, TradeDate};
pub use error::{IngestError, InsertError, ParseError, TraderError, TraderErrorKind, ValidationError};
pub use ingest::{
    ingest, ingest_files, persist, read_metadata, read_prices, DocumentSink, IngestReport,
    StockBook,
};
pub use trader::{RankedSymbol, StockTrader, Trader, TOP_LIMIT};
