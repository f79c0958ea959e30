//! # Tickerbase Web
//!
//! HTTP API over a [`Trader`].
//!
//! ## Routes
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /healthcheck` | Liveness probe, public |
//! | `GET /version` | Build version, public |
//! | `GET /stock/{name}` | Price points of a stock, by symbol or name |
//! | `GET /stock/{from}/{to}?ticker=..` | Listed stocks trading within the window |
//! | `GET /stock/top/{from}/{to}` | Best and worst performers of the window |
//!
//! Dates in paths are `DD-MM-YYYY`. Every other route requires the
//! `API-KEY` header when a key is configured.

pub mod auth;
pub mod handlers;
pub mod response;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use thiserror::Error;
use tickerbase_core::Trader;
use tower_http::trace::TraceLayer;

pub use handlers::TopPerformers;
pub use response::{ApiError, Envelope, Reason};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub trader: Arc<dyn Trader>,
    pub api_key: Arc<str>,
    pub version: Arc<str>,
}

impl AppState {
    pub fn new(trader: Arc<dyn Trader>, api_key: &str, version: &str) -> Self {
        Self {
            trader,
            api_key: Arc::from(api_key),
            version: Arc::from(version),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/version", get(handlers::version))
        .route("/stock/top/:from/:to", get(handlers::top))
        .route("/stock/:key", get(handlers::find))
        .route("/stock/:key/:to", get(handlers::find_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `0.0.0.0:<port>` until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> Result<(), WebError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| WebError::Bind { addr, source })?;

    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WebError::Serve)?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tickerbase_core::{PricePoint, Stock, TradeDate, TraderError};
    use tower::ServiceExt;

    struct StubTrader;

    fn point(symbol: &str) -> PricePoint {
        PricePoint {
            date: TradeDate::parse("2020-01-02").expect("valid date"),
            symbol: symbol.to_string(),
            open: 1.0,
            close: 2.0,
            low: 0.5,
            high: 2.5,
            volume: 100.0,
        }
    }

    impl Trader for StubTrader {
        fn find(&self, identifier: &str) -> Result<Vec<PricePoint>, TraderError> {
            match identifier {
                "AAPL" | "Apple Inc" => Ok(vec![point("AAPL")]),
                "BROKEN" => Err(TraderError::Decode {
                    reason: "missing symbol".to_string(),
                }),
                other => Err(TraderError::NotFound {
                    identifier: other.to_string(),
                }),
            }
        }

        fn find_all(
            &self,
            tickers: &[String],
            from: TradeDate,
            to: TradeDate,
        ) -> Result<Vec<Stock>, TraderError> {
            assert!(from <= to, "handler must pass parsed dates through");
            Ok(tickers
                .iter()
                .filter(|ticker| ticker.as_str() != "NOPE")
                .map(|ticker| {
                    let mut stock = Stock::bare(ticker.as_str());
                    stock.push_price_point(point(ticker)).expect("same symbol");
                    stock
                })
                .collect())
        }

        fn top(
            &self,
            from: TradeDate,
            _to: TradeDate,
            best: bool,
        ) -> Result<Vec<String>, TraderError> {
            if from.format_iso() == "2015-01-01" {
                return Ok(Vec::new());
            }
            Ok(if best {
                vec!["UP".to_string(), "FLAT".to_string()]
            } else {
                vec!["DOWN".to_string(), "FLAT".to_string()]
            })
        }
    }

    fn app(api_key: &str) -> Router {
        router(AppState::new(Arc::new(StubTrader), api_key, "0.1.0"))
    }

    async fn call(app: Router, uri: &str, key: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header(auth::API_KEY_HEADER, key);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    fn json_body(body: &[u8]) -> Value {
        serde_json::from_slice(body).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_is_public() {
        let (status, body) = call(app("secret"), "/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"I am alive");
    }

    #[tokio::test]
    async fn version_is_public_and_enveloped() {
        let (status, body) = call(app("secret"), "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"success": true, "result": "0.1.0"}));
    }

    #[tokio::test]
    async fn stock_routes_require_the_api_key() {
        let (status, body) = call(app("secret"), "/stock/AAPL", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json_body(&body), json!({"reason": "forbidden"}));

        let (status, _) = call(app("secret"), "/stock/AAPL", Some("wrong")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(app("secret"), "/stock/AAPL", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_api_key_disables_the_check() {
        let (status, _) = call(app(""), "/stock/AAPL", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn find_returns_price_points() {
        let (status, body) = call(app(""), "/stock/Apple%20Inc", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["result"][0]["symbol"], json!("AAPL"));
        assert_eq!(body["result"][0]["date"], json!("2020-01-02"));
    }

    #[tokio::test]
    async fn find_maps_not_found_to_404() {
        let (status, body) = call(app(""), "/stock/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(&body),
            json!({"success": false, "errors": {"reason": "could not find anything"}})
        );
    }

    #[tokio::test]
    async fn find_maps_decode_errors_to_500() {
        let (status, body) = call(app(""), "/stock/BROKEN", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(&body)["errors"]["reason"],
            json!("internal server error")
        );
    }

    #[tokio::test]
    async fn find_all_collects_repeated_tickers() {
        let (status, body) = call(
            app(""),
            "/stock/01-01-2020/31-03-2020?ticker=AAPL&ticker=MSFT",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        let symbols = body["result"]
            .as_array()
            .expect("array")
            .iter()
            .map(|stock| stock["symbol"].clone())
            .collect::<Vec<_>>();
        assert_eq!(symbols, vec![json!("AAPL"), json!("MSFT")]);
        assert_eq!(body["result"][0]["pricePoints"][0]["close"], json!(2.0));
    }

    #[tokio::test]
    async fn find_all_without_matches_is_404() {
        let (status, _) = call(app(""), "/stock/01-01-2020/31-03-2020", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(app(""), "/stock/01-01-2020/31-03-2020?ticker=NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_path_dates_are_rejected() {
        let (status, body) = call(app(""), "/stock/2020-01-01/31-03-2020?ticker=AAPL", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(&body)["errors"]["reason"],
            json!("invalid `from` date: 2020-01-01")
        );

        let (status, body) = call(app(""), "/stock/top/01-01-2020/32-01-2020", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(&body)["errors"]["reason"],
            json!("invalid `to` date: 32-01-2020")
        );
    }

    #[tokio::test]
    async fn top_returns_best_and_least() {
        let (status, body) = call(app(""), "/stock/top/01-01-2020/31-12-2020", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({
                "success": true,
                "result": {"best": ["UP", "FLAT"], "least": ["DOWN", "FLAT"]}
            })
        );
    }

    #[tokio::test]
    async fn top_with_an_empty_window_is_404() {
        let (status, _) = call(app(""), "/stock/top/01-01-2015/31-12-2015", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
