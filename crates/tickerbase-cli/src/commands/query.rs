use tickerbase_core::{PricePoint, Stock, StockTrader, Trader};

use crate::cli::{FindArgs, ListArgs, TopArgs};
use crate::error::CliError;

pub fn find(trader: &StockTrader, args: &FindArgs) -> Result<Vec<PricePoint>, CliError> {
    Ok(trader.find(&args.identifier)?)
}

pub fn list(trader: &StockTrader, args: &ListArgs) -> Result<Vec<Stock>, CliError> {
    if args.tickers.is_empty() {
        tracing::warn!("no --ticker given, nothing to list");
    }
    Ok(trader.find_all(&args.tickers, args.from, args.to)?)
}

pub fn top(trader: &StockTrader, args: &TopArgs) -> Result<Vec<String>, CliError> {
    Ok(trader.top(args.from, args.to, !args.worst)?)
}
