//! Transports from the session reconciler to the proxy handlers.
//!
//! `HttpProxyApi` talks to the proxy over HTTP with its own cookie store, the
//! way a browser would; the session cookie stays inside that store and is
//! never handed to the reconciler. `InProcessProxy` runs the handler logic
//! directly against a request's cookie jar, which is what server-side
//! rendering uses.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is a [`ProxyError`] rebuilt from the proxy's JSON error
//! body, so both transports report the same status and message for the same
//! rejection.

use std::sync::{Arc, Mutex, PoisonError};

use axum_extra::extract::cookie::CookieJar;
use reqwest::Url;
use reqwest::cookie::Jar;
use serde_json::Value;

use crate::config::PublicAuthConfig;
use crate::cookie::jar_from_header;
use crate::error::{AuthError, ErrorBody};
use crate::routes::auth::{self as proxy, UserEnvelope};
use crate::state::ProxyState;

/// A failed call to a proxy handler, as seen from the client side.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ProxyError {
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
}

impl ProxyError {
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), data: None }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl From<ErrorBody> for ProxyError {
    fn from(body: ErrorBody) -> Self {
        Self { status: body.status_code, message: body.message, data: body.data }
    }
}

impl From<AuthError> for ProxyError {
    fn from(err: AuthError) -> Self {
        err.body().into()
    }
}

/// Calls the reconciler makes against the proxy handlers.
#[async_trait::async_trait]
pub trait ProxyApi: Send + Sync {
    /// Returns the `user` field of the login response.
    async fn login(&self, credentials: &Value) -> Result<Value, ProxyError>;

    async fn logout(&self) -> Result<(), ProxyError>;

    /// Returns the `user` field of the user-fetch response.
    async fn fetch_user(&self) -> Result<Value, ProxyError>;
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

pub struct HttpProxyApi {
    http: reqwest::Client,
    cookies: Arc<Jar>,
    cookie_name: String,
    origin: Url,
    login_url: Url,
    logout_url: Url,
    user_url: Url,
}

impl HttpProxyApi {
    /// Build a client for the proxy served at `origin` (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    ///
    /// Returns an error if `origin` is not a valid URL or the HTTP client fails to build.
    pub fn new(origin: &str, config: &PublicAuthConfig) -> Result<Self, ProxyError> {
        let origin: Url = origin
            .parse()
            .map_err(|e| ProxyError::new(500, format!("invalid proxy origin: {e}")))?;
        let join = |route: String| {
            origin
                .join(&route)
                .map_err(|e| ProxyError::new(500, format!("invalid proxy route {route}: {e}")))
        };
        let login_url = join(config.login_route())?;
        let logout_url = join(config.logout_route())?;
        let user_url = join(config.user_route())?;

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .build()
            .map_err(|e| ProxyError::new(500, format!("HTTP client build failed: {e}")))?;

        Ok(Self { http, cookies, cookie_name: config.cookie_name.clone(), origin, login_url, logout_url, user_url })
    }

    /// Seed the cookie store with a `Cookie` header received from a browser,
    /// so calls carry the caller's session.
    pub fn forward_cookie_header(&self, header: &str) {
        for cookie in jar_from_header(header).iter() {
            self.cookies.add_cookie_str(&format!("{}={}", cookie.name(), cookie.value()), &self.origin);
        }
    }

    /// Drop the session cookie from the local store without asking the proxy.
    fn expire_session_cookie(&self) {
        let expired = format!("{}=; Max-Age=0; Path=/", self.cookie_name);
        self.cookies.add_cookie_str(&expired, &self.origin);
    }

    async fn send(&self, request: reqwest::RequestBuilder, fallback: &str) -> Result<Value, ProxyError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "auth proxy unreachable");
                ProxyError::new(500, fallback)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ProxyError::new(500, e.to_string()))?;

        if !status.is_success() {
            return Err(serde_json::from_str::<ErrorBody>(&text)
                .map_or_else(|_| ProxyError::new(status.as_u16(), fallback), ProxyError::from));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ProxyError::new(500, format!("unexpected proxy response: {e}")))
    }
}

#[async_trait::async_trait]
impl ProxyApi for HttpProxyApi {
    async fn login(&self, credentials: &Value) -> Result<Value, ProxyError> {
        let body = self
            .send(self.http.post(self.login_url.clone()).json(credentials), proxy::LOGIN_FAILED)
            .await?;
        Ok(envelope_user(body))
    }

    async fn logout(&self) -> Result<(), ProxyError> {
        match self.send(self.http.post(self.logout_url.clone()), "Logout failed").await {
            Ok(_) => Ok(()),
            Err(e) => {
                // The proxy never cleared it; drop it locally.
                self.expire_session_cookie();
                Err(e)
            }
        }
    }

    async fn fetch_user(&self) -> Result<Value, ProxyError> {
        let body = self
            .send(self.http.get(self.user_url.clone()), proxy::FETCH_USER_FAILED)
            .await?;
        Ok(envelope_user(body))
    }
}

fn envelope_user(body: Value) -> Value {
    serde_json::from_value::<UserEnvelope>(body).map_or(Value::Null, |e| e.user)
}

// =============================================================================
// IN-PROCESS TRANSPORT
// =============================================================================

/// Runs the proxy handler logic directly against one request's cookie jar.
///
/// Cookie writes and removals accumulate in the held jar; the caller returns
/// [`InProcessProxy::jar`] with its response so they reach the browser.
pub struct InProcessProxy {
    state: ProxyState,
    jar: Mutex<CookieJar>,
}

impl InProcessProxy {
    #[must_use]
    pub fn new(state: ProxyState, jar: CookieJar) -> Self {
        Self { state, jar: Mutex::new(jar) }
    }

    /// Current jar, including any cookie changes made by handler calls.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace_jar(&self, jar: CookieJar) {
        *self.jar.lock().unwrap_or_else(PoisonError::into_inner) = jar;
    }
}

#[async_trait::async_trait]
impl ProxyApi for InProcessProxy {
    async fn login(&self, credentials: &Value) -> Result<Value, ProxyError> {
        let (jar, envelope) = proxy::login_session(&self.state, self.jar(), credentials).await?;
        self.replace_jar(jar);
        Ok(envelope.user)
    }

    async fn logout(&self) -> Result<(), ProxyError> {
        let (jar, _) = proxy::logout_session(&self.state, self.jar());
        self.replace_jar(jar);
        Ok(())
    }

    async fn fetch_user(&self) -> Result<Value, ProxyError> {
        let (jar, result) = proxy::fetch_user_session(&self.state, self.jar()).await;
        self.replace_jar(jar);
        Ok(result?.user)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
