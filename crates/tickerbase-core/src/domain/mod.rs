//! # Domain Models
//!
//! Stock records as they are ingested and served.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stock`] | Ticker metadata with its embedded price history |
//! | [`PricePoint`] | One daily OHLCV observation |
//! | [`TradeDate`] | Calendar date with ISO and day-first parsing |
//!
//! A [`Stock`] only accepts price points carrying its own symbol:
//!
//! ```rust,ignore
//! use tickerbase_core::{PricePoint, Stock, TradeDate, ValidationError};
//!
//! let mut stock = Stock::bare("AAPL");
//! let point = PricePoint {
//!     date: TradeDate::parse("2020-01-02")?,
//!     symbol: "MSFT".to_string(),
//!     open: 1.0, close: 2.0, low: 0.5, high: 2.5, volume: 100.0,
//! };
//! assert!(matches!(stock.push_price_point(point), Err(ValidationError::SymbolMismatch { .. })));
//! ```

mod date;
mod models;

pub use date::TradeDate;
pub use models::{PricePoint, Stock};
