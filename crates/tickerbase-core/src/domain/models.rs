use serde::{Deserialize, Serialize};

use crate::{TradeDate, ValidationError};

/// One daily price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: TradeDate,
    pub symbol: String,
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

impl PricePoint {
    /// Intraday change, `close - open`.
    pub fn change(&self) -> f64 {
        self.close - self.open
    }
}

/// A ticker with its metadata and embedded price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub price_points: Vec<PricePoint>,
}

impl Stock {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        market_cap: f64,
        sector: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market_cap,
            sector: sector.into(),
            industry: industry.into(),
            price_points: Vec::new(),
        }
    }

    /// Minimal stock for a ticker seen only in price data.
    pub fn bare(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Append a price point, keeping encounter order.
    pub fn push_price_point(&mut self, point: PricePoint) -> Result<(), ValidationError> {
        if point.symbol != self.symbol {
            return Err(ValidationError::SymbolMismatch {
                expected: self.symbol.clone(),
                found: point.symbol,
            });
        }

        self.price_points.push(point);
        Ok(())
    }
}
