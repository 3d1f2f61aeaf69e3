//! Shared proxy state.
//!
//! DESIGN
//! ======
//! `ProxyState` is injected into Axum handlers via the `State` extractor. It
//! holds the resolved session config and the upstream backend. Nothing in it
//! changes after startup: all per-session state lives in the cookie.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::upstream::AuthBackend;

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AuthConfig>,
    pub backend: Arc<dyn AuthBackend>,
}

impl ProxyState {
    #[must_use]
    pub fn new(config: AuthConfig, backend: Arc<dyn AuthBackend>) -> Self {
        Self { config: Arc::new(config), backend }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
