//! Behavior-driven tests for ingestion
//!
//! These tests verify HOW the metadata and price tables are merged and
//! written, focusing on what ends up stored.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};
use tickerbase_core::{
    ingest, ingest_files, DocumentSink, IngestError, Stock, StockTrader, TradeDate, Trader,
};
use tickerbase_warehouse::{StorageLocation, Warehouse, WarehouseConfig, WarehouseError};

const METADATA: &str = "\
symbol,name,marketCap,sector,industry
AAPL,Apple Inc,2000000000000,Technology,Consumer Electronics
MSFT,Microsoft Corporation,1500000000000,Technology,Software
";

const PRICES: &str = "\
date,symbol,open,close,low,high,volume
2020-01-02 00:00:00,AAPL,74.06,75.09,73.80,75.15,135480400
2020-01-02 00:00:00,MSFT,158.78,160.62,158.33,160.73,22622100
2020-01-03 00:00:00,AAPL,74.29,74.36,73.19,75.14,146322800
2020-01-03 00:00:00,MSFT,158.32,158.62,157.33,159.95,21116200
2020-01-06 00:00:00,AAPL,73.45,74.95,73.19,74.99,118387200
";

struct Fixture {
    _temp: TempDir,
    metadata: PathBuf,
    prices: PathBuf,
    warehouse: Warehouse,
}

fn fixture(metadata: &str, prices: &str) -> Fixture {
    let temp = tempdir().expect("tempdir");
    let metadata_path = temp.path().join("stock.csv");
    let prices_path = temp.path().join("data.csv");
    fs::write(&metadata_path, metadata).expect("write metadata");
    fs::write(&prices_path, prices).expect("write prices");

    let warehouse = Warehouse::open(WarehouseConfig {
        location: StorageLocation::File(temp.path().join("tickerbase.duckdb")),
        max_pool_size: 2,
        ..WarehouseConfig::default()
    })
    .expect("warehouse open");

    Fixture {
        _temp: temp,
        metadata: metadata_path,
        prices: prices_path,
        warehouse,
    }
}

fn date(value: &str) -> TradeDate {
    TradeDate::parse(value).expect("valid date")
}

// =============================================================================
// Ingestion: Merging
// =============================================================================

#[test]
fn when_user_ingests_both_tables_each_symbol_becomes_one_document() {
    // Given: A metadata table and an interleaved price table
    let fixture = fixture(METADATA, PRICES);

    // When: User runs ingestion
    let report = ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices)
        .expect("ingest should succeed");

    // Then: One document per symbol, in metadata order
    assert_eq!(report.inserted, vec!["AAPL", "MSFT"]);
    assert!(report.is_complete());
    assert_eq!(report.symbols, 2);
    assert_eq!(report.price_points, 5);
    assert_eq!(fixture.warehouse.count_documents("AAPL").expect("count"), 1);
    assert_eq!(fixture.warehouse.count_documents("MSFT").expect("count"), 1);

    // And: Price points keep file order and carry the parent symbol
    let trader = StockTrader::new(fixture.warehouse.clone());
    let points = trader.find("AAPL").expect("find");
    let dates = points
        .iter()
        .map(|point| point.date.format_iso())
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2020-01-02", "2020-01-03", "2020-01-06"]);
    assert!(points.iter().all(|point| point.symbol == "AAPL"));
    assert_eq!(points[0].open, 74.06);
    assert_eq!(points[0].volume, 135_480_400.0);
}

#[test]
fn when_metadata_is_merged_the_stock_keeps_its_descriptive_fields() {
    // Given: Ingested tables
    let fixture = fixture(METADATA, PRICES);
    ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices).expect("ingest");

    // When: User lists MSFT
    let trader = StockTrader::new(fixture.warehouse.clone());
    let stocks = trader
        .find_all(
            &["MSFT".to_string()],
            date("2020-01-01"),
            date("2020-01-31"),
        )
        .expect("find_all");

    // Then: Metadata and prices are both present
    assert_eq!(stocks.len(), 1);
    let msft = &stocks[0];
    assert_eq!(msft.name, "Microsoft Corporation");
    assert_eq!(msft.market_cap, 1.5e12);
    assert_eq!(msft.sector, "Technology");
    assert_eq!(msft.industry, "Software");
    assert_eq!(msft.price_points.len(), 2);
}

#[test]
fn when_prices_mention_an_unknown_ticker_a_bare_stock_is_stored() {
    // Given: Price rows for a ticker absent from metadata
    let prices = format!("{PRICES}2020-01-02 00:00:00,ZZZ,1.0,2.0,0.5,2.5,100\n");
    let fixture = fixture(METADATA, &prices);

    // When: User runs ingestion
    let report =
        ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices).expect("ingest");

    // Then: The orphan ticker is stored with empty metadata, after the described ones
    assert_eq!(report.inserted, vec!["AAPL", "MSFT", "ZZZ"]);
    let trader = StockTrader::new(fixture.warehouse.clone());
    let stocks = trader
        .find_all(&["ZZZ".to_string()], date("2020-01-01"), date("2020-01-02"))
        .expect("find_all");
    assert_eq!(stocks.len(), 1);
    assert_eq!(stocks[0].symbol, "ZZZ");
    assert!(stocks[0].name.is_empty());
    assert!(stocks[0].sector.is_empty());
    assert!(stocks[0].industry.is_empty());
    assert_eq!(stocks[0].market_cap, 0.0);
    assert_eq!(stocks[0].price_points.len(), 1);
}

#[test]
fn when_user_ingests_twice_every_symbol_is_stored_twice() {
    // Given: Tables already ingested once
    let fixture = fixture(METADATA, PRICES);
    let first =
        ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices).expect("first run");

    // When: User runs ingestion again with the same files
    let second =
        ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices).expect("second run");

    // Then: Documents are duplicated, not replaced
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(fixture.warehouse.count_documents("AAPL").expect("count"), 2);
    assert_eq!(fixture.warehouse.count_documents("MSFT").expect("count"), 2);

    // And: Each run has its own audit trail
    let log = fixture.warehouse.ingest_log(&second.run_id).expect("log");
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|entry| entry.status == "ok"));
}

// =============================================================================
// Ingestion: Fatal Parse Errors
// =============================================================================

#[test]
fn when_a_price_cell_is_not_numeric_nothing_is_written() {
    // Given: A price table with a bad `open` on its last row
    let prices = format!("{PRICES}2020-01-07 00:00:00,MSFT,abc,1.0,0.5,2.5,100\n");
    let fixture = fixture(METADATA, &prices);

    // When: User runs ingestion
    let err = ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices)
        .expect_err("ingest must fail");

    // Then: The error names the cell
    match err {
        IngestError::Parse(parse) => {
            assert_eq!(parse.table, "prices");
            assert_eq!(parse.row, 7);
            assert_eq!(parse.column, "open");
            assert_eq!(parse.value, "abc");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // And: No document was written for any symbol
    assert_eq!(fixture.warehouse.count_documents("AAPL").expect("count"), 0);
    assert_eq!(fixture.warehouse.count_documents("MSFT").expect("count"), 0);
}

#[test]
fn when_a_price_cell_is_nan_nothing_is_written_and_queries_still_work() {
    // Given: A price table whose AAPL `open` is NaN
    let prices = format!("{PRICES}2020-01-07 00:00:00,AAPL,NaN,1.0,0.5,2.5,100\n");
    let fixture = fixture(METADATA, &prices);

    // When: User runs ingestion
    let err = ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices)
        .expect_err("ingest must fail");

    // Then: The non-finite cell is reported
    match err {
        IngestError::Parse(parse) => {
            assert_eq!(parse.row, 7);
            assert_eq!(parse.column, "open");
            assert_eq!(parse.value, "NaN");
            assert_eq!(parse.reason, "not a finite number");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // And: Nothing was stored, so ranking the window is empty rather than failing
    assert_eq!(fixture.warehouse.count_documents("AAPL").expect("count"), 0);
    let trader = StockTrader::new(fixture.warehouse.clone());
    let best = trader
        .top(date("2020-01-01"), date("2020-12-31"), true)
        .expect("top");
    assert!(best.is_empty());
}

#[test]
fn when_market_cap_is_not_numeric_the_row_number_is_reported() {
    // Given: Metadata with a bad market cap on the second data row
    let metadata = "\
symbol,name,marketCap,sector,industry
AAPL,Apple Inc,2000000000000,Technology,Consumer Electronics
MSFT,Microsoft Corporation,n/a,Technology,Software
";
    let fixture = fixture(metadata, PRICES);

    // When: User runs ingestion
    let err = ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices)
        .expect_err("ingest must fail");

    // Then: The 1-indexed row (header is row 1) is reported
    assert!(
        matches!(&err, IngestError::Parse(parse) if parse.row == 3 && parse.column == "marketCap"),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("row 3"));
    assert_eq!(fixture.warehouse.count_documents("AAPL").expect("count"), 0);
}

#[test]
fn when_a_source_file_is_missing_the_error_names_it() {
    // Given: A fixture whose price file is removed
    let fixture = fixture(METADATA, PRICES);
    fs::remove_file(&fixture.prices).expect("remove prices");

    // When: User runs ingestion
    let err = ingest_files(&fixture.warehouse, &fixture.metadata, &fixture.prices)
        .expect_err("ingest must fail");

    // Then: The missing path is reported
    match err {
        IngestError::Io { path, .. } => assert_eq!(path, fixture.prices),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Ingestion: Insert Failures
// =============================================================================

/// Sink that refuses one symbol and remembers the rest.
struct RefusingSink {
    refused: &'static str,
    written: RefCell<Vec<String>>,
}

impl DocumentSink for RefusingSink {
    fn insert_stock(&self, _run_id: &str, stock: &Stock) -> Result<i64, WarehouseError> {
        if stock.symbol == self.refused {
            return Err(WarehouseError::QueryRejected(format!(
                "refusing {}",
                stock.symbol
            )));
        }
        let mut written = self.written.borrow_mut();
        written.push(stock.symbol.clone());
        Ok(written.len() as i64)
    }
}

#[test]
fn when_one_insert_fails_the_other_symbols_are_still_written() {
    // Given: A sink that rejects MSFT
    let sink = RefusingSink {
        refused: "MSFT",
        written: RefCell::new(Vec::new()),
    };
    let prices = format!("{PRICES}2020-01-02 00:00:00,ZZZ,1.0,2.0,0.5,2.5,100\n");

    // When: User runs ingestion
    let report = ingest(&sink, METADATA.as_bytes(), prices.as_bytes()).expect("ingest");

    // Then: The failure is recorded and the batch continues
    assert_eq!(report.inserted, vec!["AAPL", "ZZZ"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].symbol, "MSFT");
    assert!(!report.is_complete());
    assert_eq!(*sink.written.borrow(), vec!["AAPL", "ZZZ"]);
}

#[test]
fn when_ingestion_uses_an_in_memory_store_documents_are_shared_with_queries() {
    // Given: An in-memory warehouse
    let warehouse = Warehouse::open_in_memory().expect("warehouse open");

    // When: Ingestion writes through one handle
    ingest(&warehouse, METADATA.as_bytes(), PRICES.as_bytes()).expect("ingest");

    // Then: A clone used for queries sees the documents
    let trader = StockTrader::new(warehouse.clone());
    assert_eq!(trader.find("Apple Inc").expect("find").len(), 3);
    assert_eq!(warehouse.location(), &StorageLocation::InMemory);
}
