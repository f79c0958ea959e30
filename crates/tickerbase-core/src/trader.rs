//! # Query Engine
//!
//! Read side over stored stock documents: point lookup, multi-ticker range
//! listing and performer ranking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tickerbase_warehouse::{SortOrder, Warehouse};

use crate::{PricePoint, Stock, TradeDate, TraderError};

/// Number of symbols returned by [`Trader::top`].
pub const TOP_LIMIT: usize = 10;

/// Queries answered against stored stock documents.
pub trait Trader: Send + Sync {
    /// Price points of the first stock whose symbol or name equals `identifier`.
    fn find(&self, identifier: &str) -> Result<Vec<PricePoint>, TraderError>;

    /// Stocks whose symbol is in `tickers` and that have at least one price
    /// point dated within `[from, to]`. Stocks are returned whole.
    fn find_all(
        &self,
        tickers: &[String],
        from: TradeDate,
        to: TradeDate,
    ) -> Result<Vec<Stock>, TraderError>;

    /// Up to [`TOP_LIMIT`] symbols ranked by the summed `close - open` of their
    /// price points within `[from, to]`; best performers first when `best`,
    /// worst first otherwise.
    fn top(&self, from: TradeDate, to: TradeDate, best: bool) -> Result<Vec<String>, TraderError>;
}

/// One row of the performer ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSymbol {
    #[serde(rename = "_id")]
    pub symbol: String,
    pub total: f64,
}

/// [`Trader`] backed by the warehouse.
#[derive(Clone)]
pub struct StockTrader {
    warehouse: Warehouse,
}

impl StockTrader {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    /// Ranking rows with their totals.
    pub fn rank(
        &self,
        from: TradeDate,
        to: TradeDate,
        best: bool,
    ) -> Result<Vec<RankedSymbol>, TraderError> {
        let order = if best {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        let rows = self.warehouse.rank_symbols(
            &from.format_iso(),
            &to.format_iso(),
            order,
            TOP_LIMIT,
        )?;

        rows.into_iter()
            .map(|row| decode::<RankedSymbol>(row))
            .collect()
    }
}

impl Trader for StockTrader {
    fn find(&self, identifier: &str) -> Result<Vec<PricePoint>, TraderError> {
        let document = self
            .warehouse
            .find_document(identifier)?
            .ok_or_else(|| TraderError::NotFound {
                identifier: identifier.to_owned(),
            })?;

        let stock = decode::<Stock>(document)?;
        Ok(stock.price_points)
    }

    fn find_all(
        &self,
        tickers: &[String],
        from: TradeDate,
        to: TradeDate,
    ) -> Result<Vec<Stock>, TraderError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        self.warehouse
            .find_documents(tickers, &from.format_iso(), &to.format_iso())?
            .into_iter()
            .map(decode::<Stock>)
            .collect()
    }

    fn top(&self, from: TradeDate, to: TradeDate, best: bool) -> Result<Vec<String>, TraderError> {
        let ranked = self.rank(from, to, best)?;
        tracing::debug!(%from, %to, best, rows = ranked.len(), "ranked symbols");
        Ok(ranked.into_iter().map(|row| row.symbol).collect())
    }
}

fn decode<T: for<'de> Deserialize<'de>>(document: Value) -> Result<T, TraderError> {
    Ok(serde_json::from_value(document)?)
}
