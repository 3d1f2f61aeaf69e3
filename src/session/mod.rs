//! Session state reconciler: the cached "current user" view.
//!
//! DESIGN
//! ======
//! A `SessionReconciler` is owned by one session context (a request being
//! rendered, or one client). It holds two pieces of state: the cached user
//! record and the token-presence signal. The signal is all a client can know
//! about an HttpOnly cookie. `logged_in` is true only when both are present.
//!
//! The reconciler never sees the token itself. It reaches the proxy handlers
//! through a [`ProxyApi`] transport and mirrors their outcome locally: a 401
//! from the proxy clears the presence signal the same way the proxy cleared
//! the cookie.

pub mod api;
pub mod bootstrap;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PublicAuthConfig;
pub use api::{HttpProxyApi, InProcessProxy, ProxyApi, ProxyError};

// =============================================================================
// USER RECORD
// =============================================================================

/// Backend user identifiers may be numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

/// Default user record: an id, a display name, and whatever else the backend sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Performs the post-logout redirect.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, target: &str);
}

/// Records the redirect target so a server response can issue it.
#[derive(Debug, Default)]
pub struct PendingRedirect {
    target: Mutex<Option<String>>,
}

impl PendingRedirect {
    /// Take the recorded target, leaving none behind.
    pub fn take(&self) -> Option<String> {
        self.target.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Navigator for PendingRedirect {
    fn navigate_to(&self, target: &str) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(target.to_owned());
    }
}

// =============================================================================
// STATE
// =============================================================================

/// The serializable part of a session: what survives from render to hydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState<U> {
    pub user: Option<U>,
    pub token_present: bool,
}

impl<U> Default for SessionState<U> {
    fn default() -> Self {
        Self { user: None, token_present: false }
    }
}

impl<U> SessionState<U> {
    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.token_present && self.user.is_some()
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

pub struct SessionReconciler<U = User> {
    config: PublicAuthConfig,
    api: Arc<dyn ProxyApi>,
    navigator: Arc<dyn Navigator>,
    state: SessionState<U>,
}

impl<U: DeserializeOwned> SessionReconciler<U> {
    /// `token_present` is the caller's observation of the session cookie.
    #[must_use]
    pub fn new(
        config: PublicAuthConfig,
        api: Arc<dyn ProxyApi>,
        navigator: Arc<dyn Navigator>,
        token_present: bool,
    ) -> Self {
        Self { config, api, navigator, state: SessionState { user: None, token_present } }
    }

    /// Restore a previously captured state, e.g. one serialized at render time.
    #[must_use]
    pub fn with_state(mut self, state: SessionState<U>) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn user(&self) -> Option<&U> {
        self.state.user.as_ref()
    }

    #[must_use]
    pub fn token_present(&self) -> bool {
        self.state.token_present
    }

    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.state.logged_in()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState<U> {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> SessionState<U> {
        self.state
    }

    /// Update the token-presence signal after observing the cookie again.
    pub fn set_token_present(&mut self, present: bool) {
        self.state.token_present = present;
    }

    /// Drop the cached user so the next [`fetch_user`](Self::fetch_user) refreshes it.
    pub fn clear_user(&mut self) {
        self.state.user = None;
    }

    /// Populate the cached user from the proxy.
    ///
    /// No-op when a user is already cached or no token is present. On
    /// failure the cache is cleared, and a 401 also clears the presence
    /// signal. The error is returned for callers that want to inspect it;
    /// ignoring it leaves the session quietly logged out.
    ///
    /// # Errors
    ///
    /// Returns the proxy's error when the fetch was attempted and failed.
    pub async fn fetch_user(&mut self) -> Result<(), ProxyError> {
        if self.state.user.is_some() || !self.state.token_present {
            return Ok(());
        }

        let result = self.api.fetch_user().await.and_then(decode_user::<U>);
        match result {
            Ok(user) => {
                self.state.user = user;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "user fetch failed, clearing cached user");
                self.state.user = None;
                if e.is_unauthorized() {
                    self.state.token_present = false;
                }
                Err(e)
            }
        }
    }

    /// Log in through the proxy and cache the returned user.
    ///
    /// Any cached user is dropped before the attempt, so a failed login
    /// leaves the session without a user.
    ///
    /// # Errors
    ///
    /// Returns the proxy's error unchanged; the caller decides how to show it.
    pub async fn login(&mut self, credentials: &Value) -> Result<(), ProxyError> {
        self.state.user = None;

        let result = self.api.login(credentials).await.and_then(|user| match decode_user::<U>(user)? {
            Some(user) => Ok(user),
            None => Err(ProxyError::new(500, "Login failed: No user data returned")),
        });

        match result {
            Ok(user) => {
                self.state.user = Some(user);
                self.state.token_present = true;
                Ok(())
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.state.token_present = false;
                }
                Err(e)
            }
        }
    }

    /// Log out locally, whatever the proxy says, then redirect.
    pub async fn logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout call failed, clearing local session anyway");
        }
        self.state.user = None;
        self.state.token_present = false;
        self.navigator.navigate_to(&self.config.redirect_on_logout);
    }
}

/// `null` means "no user"; anything else must decode into `U`.
fn decode_user<U: DeserializeOwned>(value: Value) -> Result<Option<U>, ProxyError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ProxyError::new(500, format!("unexpected user payload: {e}")))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
