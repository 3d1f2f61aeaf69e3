//! Error taxonomy for the auth proxy.
//!
//! ERROR HANDLING
//! ==============
//! `BackendError` is what the upstream client reports: whatever status,
//! message and body the backend gave, or nothing at all when it could not be
//! reached. Handlers turn it into an [`AuthError`], filling in a default
//! message and falling back to 500 when no status is known. `AuthError` is the
//! only error type that reaches the browser, always rendered as the same
//! JSON shape so the client side can rebuild it.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// BACKEND ERROR
// =============================================================================

/// Failure reported by the upstream auth backend.
///
/// `status` is `None` for network-level failures (connect refused, timeout,
/// aborted body), in which case the backend never answered.
#[derive(Debug, Clone, thiserror::Error)]
#[error("backend request failed (status {status:?}): {}", .message.as_deref().unwrap_or("no message"))]
pub struct BackendError {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub payload: Option<Value>,
}

impl BackendError {
    /// The backend could not be reached or did not produce a response.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self { status: None, message: Some(reason.into()), payload: None }
    }

    /// The backend answered with a non-success status.
    #[must_use]
    pub fn rejected(status: u16, payload: Option<Value>) -> Self {
        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { status: Some(status), message, payload }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

// =============================================================================
// AUTH ERROR
// =============================================================================

/// Errors returned by the proxy handlers.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Required configuration is missing. Fatal at handler entry.
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable token is known locally, or the backend refused it.
    #[error("{0}")]
    Unauthorized(String),

    /// The backend failed; status and message are passed through.
    #[error("{message}")]
    Backend { status: u16, message: String, payload: Option<Value> },

    /// The request body could not be parsed as JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl AuthError {
    /// Convert an upstream failure, using `fallback` when the backend gave no
    /// message. A missing status becomes 500.
    #[must_use]
    pub fn from_backend(err: BackendError, fallback: &str) -> Self {
        let status = err.status.unwrap_or(500);
        let message = match err.status {
            Some(_) => err.message.unwrap_or_else(|| fallback.to_owned()),
            None => fallback.to_owned(),
        };
        Self::Backend { status, message, payload: err.payload }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the browser.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Config(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::Backend { message, .. } => message.clone(),
            Self::InvalidBody(_) => self.to_string(),
        }
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let data = match self {
            Self::Backend { payload, .. } => payload.clone(),
            _ => None,
        };
        ErrorBody { status_code: self.status_code().as_u16(), message: self.public_message(), data }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "auth proxy failure");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "auth proxy rejected request");
        }
        (status, Json(self.body())).into_response()
    }
}

/// JSON body of every proxy error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
