//! JSON response envelope and error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tickerbase_core::{TraderError, TraderErrorKind};

/// Body of every JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Reason>,
}

impl<T> Envelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            errors: Some(Reason {
                reason: reason.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub reason: String,
}

/// Handler failures, rendered with the status they map to.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("could not find anything")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TraderError> for ApiError {
    fn from(error: TraderError) -> Self {
        match error.kind() {
            TraderErrorKind::NotFound => {
                tracing::debug!(%error, "nothing matched");
                Self::NotFound
            }
            TraderErrorKind::Decode | TraderErrorKind::Query => {
                tracing::error!(%error, "query failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // The auth rejection carries the bare reason, not the envelope.
            Self::Forbidden => (
                status,
                Json(Reason {
                    reason: self.to_string(),
                }),
            )
                .into_response(),
            other => (status, Json(Envelope::failure(other.to_string()))).into_response(),
        }
    }
}
