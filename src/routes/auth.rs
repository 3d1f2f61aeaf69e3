//! Auth proxy routes: login, logout and current-user fetch.
//!
//! Each handler is stateless across calls. The only durable state is the
//! session cookie; the backend stays the source of truth for the token. A
//! handler performs at most one cookie write or clear and at most one
//! backend call.
//!
//! The `*_session` functions hold the logic and work on a bare `CookieJar`,
//! so server-side rendering can run them in-process. The Axum handlers are
//! thin wrappers around them.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cookie::SessionCookieStore;
use crate::error::AuthError;
use crate::state::ProxyState;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials or missing token";
pub const NO_TOKEN: &str = "Not authenticated: No token found";
pub const INVALID_TOKEN: &str = "Unauthorized: Invalid token";
pub const USER_NOT_FOUND: &str = "Invalid token or user not found";
pub const LOGIN_FAILED: &str = "Login failed";
pub const FETCH_USER_FAILED: &str = "Failed to fetch user";

/// `{ "user": ... }`: success body of login and user-fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub user: Value,
}

/// `{ "success": true }`: logout acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutAck {
    pub success: bool,
}

// =============================================================================
// SESSION OPERATIONS
// =============================================================================

/// Forward credentials to the backend and store the returned token.
///
/// # Errors
///
/// - [`AuthError::Config`] if no backend base URL is configured.
/// - [`AuthError::Unauthorized`] if the backend answered without a token.
/// - [`AuthError::Backend`] with the backend's status when it rejected the call.
pub async fn login_session(
    state: &ProxyState,
    jar: CookieJar,
    credentials: &Value,
) -> Result<(CookieJar, UserEnvelope), AuthError> {
    state.config.backend_url(&state.config.public.login_endpoint)?;
    forward_login(state, jar, credentials).await
}

/// Login without the config check; callers have already done it.
async fn forward_login(
    state: &ProxyState,
    jar: CookieJar,
    credentials: &Value,
) -> Result<(CookieJar, UserEnvelope), AuthError> {
    let response = state
        .backend
        .login(credentials)
        .await
        .map_err(|e| AuthError::from_backend(e, LOGIN_FAILED))?;

    let Some(token) = response.token.filter(|t| !t.is_empty()) else {
        return Err(AuthError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let jar = SessionCookieStore::new(&state.config.private).write(jar, token);
    tracing::info!("login succeeded, session cookie set");

    Ok((jar, UserEnvelope { user: response.user.unwrap_or(Value::Null) }))
}

/// Clear the session cookie. Never contacts the backend and never fails.
#[must_use]
pub fn logout_session(state: &ProxyState, jar: CookieJar) -> (CookieJar, LogoutAck) {
    let jar = SessionCookieStore::new(&state.config.private).clear(jar);
    tracing::info!("session cookie cleared");
    (jar, LogoutAck { success: true })
}

/// Resolve the current user from the token in `jar`.
///
/// The returned jar carries a cookie removal when the backend reported the
/// token as unauthorized, so the next request does not retry a dead token.
pub async fn fetch_user_session(state: &ProxyState, jar: CookieJar) -> (CookieJar, Result<UserEnvelope, AuthError>) {
    let config = &state.config;
    let store = SessionCookieStore::new(&config.private);

    let Some(token) = store.read(&jar) else {
        return (jar, Err(AuthError::Unauthorized(NO_TOKEN.into())));
    };
    if let Err(e) = config.backend_url(&config.public.user_endpoint) {
        return (jar, Err(e));
    }

    match state.backend.fetch_user(&token).await {
        Ok(Value::Null) => {
            tracing::warn!("backend returned no user for token, evicting session cookie");
            (store.clear(jar), Err(AuthError::Unauthorized(USER_NOT_FOUND.into())))
        }
        Ok(user) => (jar, Ok(UserEnvelope { user })),
        Err(e) if e.is_unauthorized() => {
            tracing::warn!("backend rejected session token, evicting session cookie");
            (store.clear(jar), Err(AuthError::Unauthorized(INVALID_TOKEN.into())))
        }
        Err(e) => (jar, Err(AuthError::from_backend(e, FETCH_USER_FAILED))),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/login`: forward credentials, set the session cookie, return `{user}`.
pub async fn login(
    State(state): State<ProxyState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<UserEnvelope>), AuthError> {
    // Config first: a misconfigured proxy answers 500 even for a malformed body.
    state.config.backend_url(&state.config.public.login_endpoint)?;
    let credentials = parse_credentials(&body)?;
    let (jar, envelope) = forward_login(&state, jar, &credentials).await?;
    Ok((jar, Json(envelope)))
}

/// `POST /api/auth/logout`: clear the session cookie.
pub async fn logout(State(state): State<ProxyState>, jar: CookieJar) -> (CookieJar, Json<LogoutAck>) {
    let (jar, ack) = logout_session(&state, jar);
    (jar, Json(ack))
}

/// `GET /api/auth/user`: return the user owning the session cookie.
pub async fn user(State(state): State<ProxyState>, jar: CookieJar) -> (CookieJar, Result<Json<UserEnvelope>, AuthError>) {
    let (jar, result) = fetch_user_session(&state, jar).await;
    (jar, result.map(Json))
}

/// Credentials are opaque JSON. An empty body is sent upstream as `{}`.
fn parse_credentials(body: &[u8]) -> Result<Value, AuthError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| AuthError::InvalidBody(e.to_string()))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
