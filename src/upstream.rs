//! Upstream auth client: outbound calls to the credential-issuing backend.
//!
//! Thin HTTP wrapper around the backend's login and user endpoints. The
//! `AuthBackend` trait is the seam handlers depend on, so tests can swap in
//! an in-memory backend. Response decoding lives in pure functions for
//! testability.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::AuthConfig;
use crate::error::BackendError;

/// Successful backend login payload.
///
/// Both fields are optional on the wire; handlers decide what a missing
/// token means.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Calls made against the remote auth backend.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Forward the caller's credential payload to the backend login endpoint.
    async fn login(&self, credentials: &Value) -> Result<LoginResponse, BackendError>;

    /// Fetch the user owning `token`. `Value::Null` means the backend
    /// answered successfully with no user.
    async fn fetch_user(&self, token: &str) -> Result<Value, BackendError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAuthBackend {
    http: reqwest::Client,
    login_url: String,
    user_url: String,
}

impl HttpAuthBackend {
    /// Build a backend client from the resolved session config.
    ///
    /// An empty base URL is accepted here; handlers reject requests before
    /// any call is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, BackendError> {
        let timeouts = config.private.timeouts;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::unreachable(format!("HTTP client build failed: {e}")))?;
        let base = &config.private.api_base_url;
        Ok(Self {
            http,
            login_url: format!("{base}{}", config.public.login_endpoint),
            user_url: format!("{base}{}", config.public.user_endpoint),
        })
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Value) -> Result<LoginResponse, BackendError> {
        let response = self
            .http
            .post(&self.login_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await
            .map_err(network_error)?;

        let (status, text) = read_response(response).await?;
        check_status(status, &text)?;
        parse_login_response(&text)
    }

    async fn fetch_user(&self, token: &str) -> Result<Value, BackendError> {
        let response = self
            .http
            .get(&self.user_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_error)?;

        let (status, text) = read_response(response).await?;
        check_status(status, &text)?;
        parse_user_response(&text)
    }
}

async fn read_response(response: reqwest::Response) -> Result<(u16, String), BackendError> {
    let status = response.status().as_u16();
    let text = response.text().await.map_err(network_error)?;
    Ok((status, text))
}

fn network_error(e: reqwest::Error) -> BackendError {
    tracing::warn!(error = %e, timeout = e.is_timeout(), connect = e.is_connect(), "auth backend unreachable");
    BackendError::unreachable(e.to_string())
}

// =============================================================================
// PARSING
// =============================================================================

/// Turn a non-2xx status into a [`BackendError`] carrying the decoded body.
fn check_status(status: u16, body: &str) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(BackendError::rejected(status, parse_error_payload(body)))
}

/// Error bodies are JSON when possible, otherwise kept as a plain string.
fn parse_error_payload(body: &str) -> Option<Value> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_owned())))
}

fn parse_login_response(body: &str) -> Result<LoginResponse, BackendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(LoginResponse::default());
    }
    serde_json::from_str(trimmed)
        .map_err(|e| BackendError::unreachable(format!("unexpected login response: {e}")))
}

fn parse_user_response(body: &str) -> Result<Value, BackendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed)
        .map_err(|e| BackendError::unreachable(format!("unexpected user response: {e}")))
}

#[cfg(test)]
#[path = "upstream_test.rs"]
mod tests;
