//! Table and sequence bootstrap for the document store.

use ::duckdb::Connection;

const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS stock_document_ids START 1;

CREATE TABLE IF NOT EXISTS stock_documents (
    document_id BIGINT PRIMARY KEY,
    symbol TEXT,
    name TEXT NOT NULL DEFAULT '',
    market_cap DOUBLE NOT NULL DEFAULT 0,
    sector TEXT NOT NULL DEFAULT '',
    industry TEXT NOT NULL DEFAULT '',
    run_id TEXT,
    inserted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS price_points (
    document_id BIGINT NOT NULL,
    ordinal INTEGER NOT NULL,
    date DATE NOT NULL,
    symbol TEXT NOT NULL,
    open DOUBLE NOT NULL,
    close DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    volume DOUBLE NOT NULL,
    PRIMARY KEY(document_id, ordinal)
);

CREATE TABLE IF NOT EXISTS ingest_log (
    run_id TEXT NOT NULL,
    symbol TEXT,
    document_id BIGINT,
    price_points BIGINT NOT NULL,
    status TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_stock_documents_symbol ON stock_documents(symbol);
CREATE INDEX IF NOT EXISTS idx_stock_documents_name ON stock_documents(name);
CREATE INDEX IF NOT EXISTS idx_price_points_date ON price_points(date);
"#;

/// Create tables, indexes and the document id sequence when they are missing.
///
/// # Errors
/// Returns an error if the bootstrap SQL fails to execute.
pub fn ensure_schema(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(SCHEMA)
}
