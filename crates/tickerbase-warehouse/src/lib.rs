//! # Tickerbase Warehouse
//!
//! DuckDB-backed document store for stock records.
//!
//! ## Overview
//!
//! A stock document is one row of `stock_documents` plus the rows of
//! `price_points` it owns. Documents are written with [`Warehouse::insert_document`]
//! inside a single transaction and read back as JSON objects in the storage
//! shape:
//!
//! ```text
//! { "_id", "symbol", "name", "marketCap", "sector", "industry",
//!   "pricePoints": [ { "date", "symbol", "open", "close", "low", "high", "volume" } ] }
//! ```
//!
//! Decoding those objects into domain types is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickerbase_warehouse::{DocumentRecord, PricePointRecord, SortOrder, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_in_memory()?;
//!
//!     let document = DocumentRecord {
//!         symbol: "AAPL".to_string(),
//!         name: "Apple Inc".to_string(),
//!         market_cap: 2.8e12,
//!         sector: "Technology".to_string(),
//!         industry: "Consumer Electronics".to_string(),
//!         price_points: vec![PricePointRecord {
//!             date: "2020-01-02".to_string(),
//!             symbol: "AAPL".to_string(),
//!             open: 74.06,
//!             close: 75.09,
//!             low: 73.8,
//!             high: 75.15,
//!             volume: 135_480_400.0,
//!         }],
//!     };
//!     warehouse.insert_document("run-0001", &document)?;
//!
//!     let ranked = warehouse.rank_symbols("2020-01-01", "2020-12-31", SortOrder::Descending, 10)?;
//!     println!("{ranked:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `stock_documents` | One row per inserted stock document |
//! | `price_points` | Price points owned by a document, ordered by `ordinal` |
//! | `ingest_log` | One row per document written by an ingestion run |
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `vw_unwound_price_points` | Price points flattened with their document's symbol |

pub mod duckdb;
pub mod error;
pub mod schema;
pub mod views;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{params, params_from_iter, Connection, ToSql};
use serde::Serialize;
use serde_json::{Map, Number, Value};

pub use crate::duckdb::{DuckDbConnectionManager, PooledConnection, StorageLocation};
pub use error::WarehouseError;

/// Field names of a document header, in `SELECT` order.
pub const DOCUMENT_FIELDS: [&str; 6] = ["_id", "symbol", "name", "marketCap", "sector", "industry"];

/// Field names of an embedded price point, in `SELECT` order.
pub const PRICE_POINT_FIELDS: [&str; 7] =
    ["date", "symbol", "open", "close", "low", "high", "volume"];

/// Field names of a ranking row.
pub const RANK_FIELDS: [&str; 2] = ["_id", "total"];

const DOCUMENT_COLUMNS: &str = "d.document_id, d.symbol, d.name, d.market_cap, d.sector, d.industry";

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Where the database lives.
    pub location: StorageLocation,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
    /// Upper bound for opening the database.
    pub connect_timeout_ms: u64,
    /// Upper bound for reading a query result.
    pub query_timeout_ms: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            location: StorageLocation::File(resolve_tickerbase_home().join("tickerbase.duckdb")),
            max_pool_size: 4,
            connect_timeout_ms: 20_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl WarehouseConfig {
    /// Default limits over a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: StorageLocation::InMemory,
            ..Self::default()
        }
    }

    fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }
}

/// One price point of a document to insert.
#[derive(Debug, Clone)]
pub struct PricePointRecord {
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    pub symbol: String,
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

/// A stock document to insert.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub symbol: String,
    pub name: String,
    pub market_cap: f64,
    pub sector: String,
    pub industry: String,
    pub price_points: Vec<PricePointRecord>,
}

/// Sort direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A row of the ingestion audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestLogEntry {
    pub symbol: Option<String>,
    pub document_id: Option<i64>,
    pub price_points: i64,
    pub status: String,
}

/// Handle to the document store.
///
/// Cloning is cheap: clones share the same connection pool and database.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse over a private in-memory database.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::in_memory())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let StorageLocation::File(path) = &config.location {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::connect(
            config.location.clone(),
            config.max_pool_size,
            Duration::from_millis(config.connect_timeout_ms.max(1)),
        )?;
        let warehouse = Self { config, manager };
        warehouse.initialize()?;
        tracing::debug!(location = %warehouse.location().describe(), "warehouse opened");
        Ok(warehouse)
    }

    /// Initialize database schema and views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.acquire()?;
        schema::ensure_schema(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Where the database lives.
    pub fn location(&self) -> &StorageLocation {
        self.manager.location()
    }

    /// Borrow a raw connection from the pool.
    pub fn acquire(&self) -> Result<PooledConnection, WarehouseError> {
        Ok(self.manager.acquire()?)
    }

    /// Insert one document and its price points; returns the new document id.
    ///
    /// Always inserts: writing the same symbol twice yields two documents.
    /// The document, its price points and its audit row are committed together.
    pub fn insert_document(
        &self,
        run_id: &str,
        document: &DocumentRecord,
    ) -> Result<i64, WarehouseError> {
        let connection = self.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<i64, WarehouseError> {
            let document_id: i64 =
                connection.query_row("SELECT nextval('stock_document_ids')", [], |row| row.get(0))?;

            let params: [&dyn ToSql; 7] = [
                &document_id,
                &document.symbol,
                &document.name,
                &document.market_cap,
                &document.sector,
                &document.industry,
                &run_id,
            ];
            connection.execute(
                "INSERT INTO stock_documents \
                 (document_id, symbol, name, market_cap, sector, industry, run_id, inserted_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;

            let mut statement = connection.prepare(
                "INSERT INTO price_points \
                 (document_id, ordinal, date, symbol, open, close, low, high, volume) \
                 VALUES (?, ?, CAST(? AS DATE), ?, ?, ?, ?, ?, ?)",
            )?;
            for (ordinal, point) in document.price_points.iter().enumerate() {
                let ordinal = ordinal as i64;
                let params: [&dyn ToSql; 9] = [
                    &document_id,
                    &ordinal,
                    &point.date,
                    &point.symbol,
                    &point.open,
                    &point.close,
                    &point.low,
                    &point.high,
                    &point.volume,
                ];
                statement.execute(params.as_slice())?;
            }

            let price_point_count = document.price_points.len() as i64;
            let params: [&dyn ToSql; 4] =
                [&run_id, &document.symbol, &document_id, &price_point_count];
            connection.execute(
                "INSERT INTO ingest_log \
                 (run_id, symbol, document_id, price_points, status, timestamp) \
                 VALUES (?, ?, ?, ?, 'ok', CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;

            Ok(document_id)
        })();

        finalize_transaction(&connection, result)
    }

    /// First document (lowest id) whose symbol or name equals `key`.
    pub fn find_document(&self, key: &str) -> Result<Option<Value>, WarehouseError> {
        let started = Instant::now();
        let connection = self.acquire()?;

        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM stock_documents d \
             WHERE d.symbol = ? OR d.name = ? \
             ORDER BY d.document_id LIMIT 1"
        );
        let mut statement = connection.prepare(sql.as_str())?;
        let mut rows = statement.query(params![key, key])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let document_id: i64 = row.get(0)?;
        let mut document = read_object(row, &DOCUMENT_FIELDS)?;
        drop(rows);

        let price_points = self.load_price_points(&connection, document_id, started)?;
        document.insert(String::from("pricePoints"), Value::Array(price_points));
        Ok(Some(Value::Object(document)))
    }

    /// Documents whose symbol is in `symbols` and that own at least one price
    /// point dated within `[from, to]`, in insertion order.
    ///
    /// Matching documents are returned whole, including out-of-window price points.
    pub fn find_documents(
        &self,
        symbols: &[String],
        from: &str,
        to: &str,
    ) -> Result<Vec<Value>, WarehouseError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let connection = self.acquire()?;
        let placeholders = vec!["?"; symbols.len()].join(", ");
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM stock_documents d \
             WHERE d.symbol IN ({placeholders}) \
             AND EXISTS (\
                 SELECT 1 FROM price_points p \
                 WHERE p.document_id = d.document_id \
                 AND p.date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)\
             ) \
             ORDER BY d.document_id"
        );

        let values = symbols
            .iter()
            .map(String::as_str)
            .chain([from, to])
            .collect::<Vec<_>>();

        let mut headers = Vec::new();
        {
            let mut statement = connection.prepare(sql.as_str())?;
            let mut rows = statement.query(params_from_iter(values.iter()))?;
            while let Some(row) = rows.next()? {
                ensure_timeout(started, self.config.query_timeout())?;
                let document_id: i64 = row.get(0)?;
                headers.push((document_id, read_object(row, &DOCUMENT_FIELDS)?));
            }
        }

        let mut documents = Vec::with_capacity(headers.len());
        for (document_id, mut document) in headers {
            let price_points = self.load_price_points(&connection, document_id, started)?;
            document.insert(String::from("pricePoints"), Value::Array(price_points));
            documents.push(Value::Object(document));
        }
        Ok(documents)
    }

    /// Group in-window price points by their document's symbol and rank the
    /// groups by `SUM(close - open)`.
    ///
    /// Rows come back as `{"_id": <symbol>, "total": <sum>}` objects.
    pub fn rank_symbols(
        &self,
        from: &str,
        to: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<Value>, WarehouseError> {
        if limit == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "ranking limit must be greater than zero",
            )));
        }

        let started = Instant::now();
        let connection = self.acquire()?;
        // Direction comes from the enum and the limit is numeric, so formatting is safe.
        let sql = format!(
            "SELECT document_symbol AS _id, SUM(change) AS total \
             FROM vw_unwound_price_points \
             WHERE date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE) \
             GROUP BY document_symbol \
             ORDER BY total {direction} \
             LIMIT {limit}",
            direction = order.as_sql(),
        );

        let mut statement = connection.prepare(sql.as_str())?;
        let mut rows = statement.query(params![from, to])?;
        let mut ranked = Vec::new();
        while let Some(row) = rows.next()? {
            ensure_timeout(started, self.config.query_timeout())?;
            ranked.push(Value::Object(read_object(row, &RANK_FIELDS)?));
        }
        Ok(ranked)
    }

    /// Number of stored documents carrying `symbol`.
    pub fn count_documents(&self, symbol: &str) -> Result<i64, WarehouseError> {
        let connection = self.acquire()?;
        let count = connection.query_row(
            "SELECT COUNT(*) FROM stock_documents WHERE symbol = ?",
            params![symbol],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Audit rows written by one ingestion run, in write order.
    pub fn ingest_log(&self, run_id: &str) -> Result<Vec<IngestLogEntry>, WarehouseError> {
        let connection = self.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, document_id, price_points, status FROM ingest_log \
             WHERE run_id = ? ORDER BY document_id",
        )?;
        let entries = statement
            .query_map(params![run_id], |row| {
                Ok(IngestLogEntry {
                    symbol: row.get(0)?,
                    document_id: row.get(1)?,
                    price_points: row.get(2)?,
                    status: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn load_price_points(
        &self,
        connection: &Connection,
        document_id: i64,
        started: Instant,
    ) -> Result<Vec<Value>, WarehouseError> {
        let mut statement = connection.prepare(
            "SELECT CAST(date AS VARCHAR), symbol, open, close, low, high, volume \
             FROM price_points WHERE document_id = ? ORDER BY ordinal",
        )?;
        let mut rows = statement.query(params![document_id])?;
        let mut points = Vec::new();
        while let Some(row) = rows.next()? {
            ensure_timeout(started, self.config.query_timeout())?;
            points.push(Value::Object(read_object(row, &PRICE_POINT_FIELDS)?));
        }
        Ok(points)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Read the leading columns of a row into a JSON object keyed by `fields`.
fn read_object(row: &::duckdb::Row<'_>, fields: &[&str]) -> Result<Map<String, Value>, ::duckdb::Error> {
    let mut object = Map::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let value: DuckValue = row.get(index)?;
        object.insert((*field).to_string(), to_json_value(value));
    }
    Ok(object)
}

/// Convert a DuckDB value to a JSON value.
fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        other => Value::String(format!("{other:?}")),
    }
}

/// Convert an f64 to a JSON number, returning Null for NaN/Inf.
fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Ensure that the query has not exceeded the timeout.
fn ensure_timeout(started: Instant, timeout: Duration) -> Result<(), WarehouseError> {
    if started.elapsed() > timeout {
        return Err(WarehouseError::QueryTimeout {
            timeout_ms: crate::duckdb::duration_ms(timeout),
        });
    }
    Ok(())
}

/// Resolve the tickerbase home directory from environment or default.
fn resolve_tickerbase_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKERBASE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickerbase");
    }

    PathBuf::from(".tickerbase")
}
