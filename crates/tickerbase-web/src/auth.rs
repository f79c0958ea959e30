//! API-key check for non-public routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::ApiError;
use crate::AppState;

/// Header carrying the client's key.
pub const API_KEY_HEADER: &str = "API-KEY";

/// Routes reachable without a key.
pub const PUBLIC_ROUTES: [&str; 2] = ["/healthcheck", "/version"];

/// Reject requests whose `API-KEY` header does not match the configured key.
///
/// An empty configured key disables the check.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if state.api_key.is_empty() || PUBLIC_ROUTES.contains(&path) {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented == Some(&*state.api_key) {
        return next.run(request).await;
    }

    tracing::warn!(path, "rejected request without a valid api key");
    ApiError::Forbidden.into_response()
}
