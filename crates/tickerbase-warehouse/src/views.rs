//! Database views for analytical queries.

use ::duckdb::Connection;

/// Create database views used by the ranking query.
///
/// Creates the following views:
/// - `vw_unwound_price_points`: one row per (document, price point), carrying
///   the owning document's symbol rather than the price point's copy
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_unwound_price_points AS
SELECT
    d.document_id,
    d.symbol AS document_symbol,
    p.ordinal,
    p.date,
    p.open,
    p.close,
    p.low,
    p.high,
    p.volume,
    p.close - p.open AS change
FROM stock_documents d
JOIN price_points p ON p.document_id = d.document_id;
",
    )?;

    Ok(())
}
