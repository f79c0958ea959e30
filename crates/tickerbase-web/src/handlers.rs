//! Route handlers.
//!
//! Path dates use the `DD-MM-YYYY` format. Queries run on the blocking pool.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tickerbase_core::{PricePoint, Stock, TradeDate, TraderError};

use crate::response::{ApiError, Envelope};
use crate::AppState;

/// Result of `/stock/top/{from}/{to}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPerformers {
    pub best: Vec<String>,
    pub least: Vec<String>,
}

pub async fn healthcheck() -> &'static str {
    "I am alive"
}

pub async fn version(State(state): State<AppState>) -> Json<Envelope<String>> {
    Json(Envelope::ok(state.version.to_string()))
}

/// `GET /stock/{name}`: price points of the stock with that symbol or name.
pub async fn find(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Envelope<Vec<PricePoint>>>, ApiError> {
    let trader = state.trader.clone();
    let points = run_blocking(move || trader.find(&name)).await?;
    Ok(Json(Envelope::ok(points)))
}

/// `GET /stock/{from}/{to}?ticker=..`: listed stocks trading within the window.
pub async fn find_all(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<Vec<Stock>>>, ApiError> {
    let from = parse_path_date("from", &from)?;
    let to = parse_path_date("to", &to)?;
    let tickers = params
        .into_iter()
        .filter(|(key, _)| key == "ticker")
        .map(|(_, value)| value)
        .collect::<Vec<_>>();

    let trader = state.trader.clone();
    let stocks = run_blocking(move || trader.find_all(&tickers, from, to)).await?;
    if stocks.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(Envelope::ok(stocks)))
}

/// `GET /stock/top/{from}/{to}`: best and worst performers of the window.
pub async fn top(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Result<Json<Envelope<TopPerformers>>, ApiError> {
    let from = parse_path_date("from", &from)?;
    let to = parse_path_date("to", &to)?;

    let trader = state.trader.clone();
    let performers = run_blocking(move || {
        Ok(TopPerformers {
            best: trader.top(from, to, true)?,
            least: trader.top(from, to, false)?,
        })
    })
    .await?;

    if performers.best.is_empty() && performers.least.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(Envelope::ok(performers)))
}

fn parse_path_date(label: &str, value: &str) -> Result<TradeDate, ApiError> {
    TradeDate::parse_day_first(value).map_err(|error| {
        tracing::debug!(%error, label, "rejected path date");
        ApiError::BadRequest(format!("invalid `{label}` date: {value}"))
    })
}

async fn run_blocking<T, F>(query: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, TraderError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(query)
        .await
        .map_err(|error| {
            tracing::error!(%error, "query task failed");
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
