//! # Ingestion Merger
//!
//! Builds one [`Stock`] per ticker from a metadata table and a price table,
//! then writes each stock as a new document.
//!
//! Both tables are CSV with a header row:
//!
//! | Table | Columns |
//! |-------|---------|
//! | metadata | `symbol, name, marketCap, sector, industry` |
//! | prices | `date, symbol, open, close, low, high, volume` |
//!
//! The price date is the first whitespace-delimited token of its cell, as
//! `YYYY-MM-DD`. Both tables are parsed completely before anything is written,
//! so a malformed cell anywhere aborts the run with nothing persisted.
//! Persisting always inserts: ingesting the same files twice stores every
//! ticker twice.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tickerbase_warehouse::{DocumentRecord, PricePointRecord, Warehouse, WarehouseError};
use uuid::Uuid;

use crate::{IngestError, InsertError, ParseError, PricePoint, Stock, TradeDate};

const METADATA_TABLE: &str = "metadata";
const PRICES_TABLE: &str = "prices";

/// Stocks keyed by symbol, in first-seen order.
#[derive(Debug, Default)]
pub struct StockBook {
    stocks: Vec<Stock>,
    index: HashMap<String, usize>,
}

impl StockBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store metadata for a ticker. A repeated symbol replaces the earlier
    /// entry but keeps its position.
    pub fn insert(&mut self, stock: Stock) {
        match self.index.get(&stock.symbol) {
            Some(&position) => self.stocks[position] = stock,
            None => {
                self.index.insert(stock.symbol.clone(), self.stocks.len());
                self.stocks.push(stock);
            }
        }
    }

    /// The stock for `symbol`, synthesizing a bare one when it is unknown.
    pub fn entry(&mut self, symbol: &str) -> &mut Stock {
        let position = match self.index.get(symbol) {
            Some(&position) => position,
            None => {
                let position = self.stocks.len();
                self.index.insert(symbol.to_owned(), position);
                self.stocks.push(Stock::bare(symbol));
                position
            }
        };
        &mut self.stocks[position]
    }

    pub fn get(&self, symbol: &str) -> Option<&Stock> {
        self.index.get(symbol).map(|&position| &self.stocks[position])
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn price_point_count(&self) -> usize {
        self.stocks.iter().map(|stock| stock.price_points.len()).sum()
    }

    pub fn into_stocks(self) -> Vec<Stock> {
        self.stocks
    }
}

/// Destination for ingested stocks.
pub trait DocumentSink {
    /// Insert `stock` as a new document and return its id.
    fn insert_stock(&self, run_id: &str, stock: &Stock) -> Result<i64, WarehouseError>;
}

impl DocumentSink for Warehouse {
    fn insert_stock(&self, run_id: &str, stock: &Stock) -> Result<i64, WarehouseError> {
        self.insert_document(run_id, &document_record(stock))
    }
}

/// Outcome of one ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    pub run_id: String,
    /// Number of distinct tickers merged.
    pub symbols: usize,
    /// Number of price points across all tickers.
    pub price_points: usize,
    /// Symbols written, in write order.
    pub inserted: Vec<String>,
    /// Documents that could not be written.
    pub failed: Vec<InsertError>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parse the metadata table into a fresh [`StockBook`].
pub fn read_metadata<R: Read>(reader: R) -> Result<StockBook, IngestError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut book = StockBook::new();
    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let row = row_number(index);

        let symbol = cell(&record, 0, METADATA_TABLE, "symbol", row)?;
        let name = cell(&record, 1, METADATA_TABLE, "name", row)?;
        let market_cap = number(&record, 2, METADATA_TABLE, "marketCap", row)?;
        let sector = cell(&record, 3, METADATA_TABLE, "sector", row)?;
        let industry = cell(&record, 4, METADATA_TABLE, "industry", row)?;

        book.insert(Stock::new(symbol, name, market_cap, sector, industry));
    }

    Ok(book)
}

/// Parse the price table and append each row to its stock in `book`.
///
/// Tickers missing from `book` are added as bare stocks.
pub fn read_prices<R: Read>(book: &mut StockBook, reader: R) -> Result<(), IngestError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let row = row_number(index);

        let raw_date = cell(&record, 0, PRICES_TABLE, "date", row)?;
        let date = TradeDate::parse_leading(raw_date).map_err(|error| ParseError {
            table: PRICES_TABLE,
            row,
            column: "date",
            value: raw_date.to_owned(),
            reason: error.to_string(),
        })?;
        let symbol = cell(&record, 1, PRICES_TABLE, "symbol", row)?;

        let point = PricePoint {
            date,
            symbol: symbol.to_owned(),
            open: number(&record, 2, PRICES_TABLE, "open", row)?,
            close: number(&record, 3, PRICES_TABLE, "close", row)?,
            low: number(&record, 4, PRICES_TABLE, "low", row)?,
            high: number(&record, 5, PRICES_TABLE, "high", row)?,
            volume: number(&record, 6, PRICES_TABLE, "volume", row)?,
        };

        book.entry(symbol)
            .push_price_point(point)
            .map_err(|error| ParseError {
                table: PRICES_TABLE,
                row,
                column: "symbol",
                value: symbol.to_owned(),
                reason: error.to_string(),
            })?;
    }

    Ok(())
}

/// Write every stock as a new document, in order.
///
/// A failed insert is logged and recorded; the remaining stocks are still written.
pub fn persist<S>(sink: &S, stocks: &[Stock]) -> IngestReport
where
    S: DocumentSink + ?Sized,
{
    let run_id = Uuid::new_v4().to_string();
    let mut report = IngestReport {
        run_id: run_id.clone(),
        symbols: stocks.len(),
        price_points: stocks.iter().map(|stock| stock.price_points.len()).sum(),
        inserted: Vec::with_capacity(stocks.len()),
        failed: Vec::new(),
    };

    for stock in stocks {
        match sink.insert_stock(&run_id, stock) {
            Ok(document_id) => {
                tracing::info!(
                    symbol = %stock.symbol,
                    document_id,
                    price_points = stock.price_points.len(),
                    "inserted stock"
                );
                report.inserted.push(stock.symbol.clone());
            }
            Err(source) => {
                tracing::error!(symbol = %stock.symbol, error = %source, "insert failed");
                report.failed.push(InsertError {
                    symbol: stock.symbol.clone(),
                    source,
                });
            }
        }
    }

    tracing::info!(
        run_id = %report.run_id,
        inserted = report.inserted.len(),
        failed = report.failed.len(),
        "ingestion finished"
    );
    report
}

/// Merge both tables and persist the result.
pub fn ingest<S, M, P>(sink: &S, metadata: M, prices: P) -> Result<IngestReport, IngestError>
where
    S: DocumentSink + ?Sized,
    M: Read,
    P: Read,
{
    let mut book = read_metadata(metadata)?;
    let described = book.len();
    read_prices(&mut book, prices)?;
    tracing::debug!(
        described,
        symbols = book.len(),
        price_points = book.price_point_count(),
        "parsed source tables"
    );

    Ok(persist(sink, &book.into_stocks()))
}

/// Open both files and run [`ingest`].
pub fn ingest_files<S>(
    sink: &S,
    metadata_path: &Path,
    prices_path: &Path,
) -> Result<IngestReport, IngestError>
where
    S: DocumentSink + ?Sized,
{
    let metadata = open(metadata_path)?;
    let prices = open(prices_path)?;
    ingest(sink, metadata, prices)
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn document_record(stock: &Stock) -> DocumentRecord {
    DocumentRecord {
        symbol: stock.symbol.clone(),
        name: stock.name.clone(),
        market_cap: stock.market_cap,
        sector: stock.sector.clone(),
        industry: stock.industry.clone(),
        price_points: stock
            .price_points
            .iter()
            .map(|point| PricePointRecord {
                date: point.date.format_iso(),
                symbol: point.symbol.clone(),
                open: point.open,
                close: point.close,
                low: point.low,
                high: point.high,
                volume: point.volume,
            })
            .collect(),
    }
}

/// Data rows start at line 2; the header is line 1.
fn row_number(index: usize) -> u64 {
    index as u64 + 2
}

fn cell<'r>(
    record: &'r StringRecord,
    position: usize,
    table: &'static str,
    column: &'static str,
    row: u64,
) -> Result<&'r str, ParseError> {
    record.get(position).ok_or_else(|| ParseError {
        table,
        row,
        column,
        value: String::new(),
        reason: String::from("missing column"),
    })
}

fn number(
    record: &StringRecord,
    position: usize,
    table: &'static str,
    column: &'static str,
    row: u64,
) -> Result<f64, ParseError> {
    let raw = cell(record, position, table, column, row)?;
    let failure = |reason: String| ParseError {
        table,
        row,
        column,
        value: raw.to_owned(),
        reason,
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|error| failure(error.to_string()))?;
    // NaN and infinities cannot be read back out of the store as JSON numbers.
    if !value.is_finite() {
        return Err(failure(String::from("not a finite number")));
    }
    Ok(value)
}
