//! Bootstrap synchronizers: one-shot user fetches at render and hydration time.
//!
//! Both run only when a token is present and no user is cached. The render
//! pass fills the cache before the first render so the page shows the
//! logged-in state. The hydration pass covers a skipped render or a cache
//! that did not survive serialization. Fetch failures are logged and
//! swallowed: the session just renders as logged out.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;

use super::{HttpProxyApi, InProcessProxy, PendingRedirect, ProxyError, SessionReconciler, SessionState};
use crate::config::PublicAuthConfig;
use crate::cookie::{jar_from_header, token_present};
use crate::state::ProxyState;

/// Where a synchronizer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Render,
    Hydrate,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Hydrate => "hydrate",
        }
    }
}

/// Whether a synchronizer would fetch for this reconciler.
#[must_use]
pub fn needs_sync<U: DeserializeOwned>(reconciler: &SessionReconciler<U>) -> bool {
    reconciler.token_present() && reconciler.user().is_none()
}

/// Render-time synchronizer.
pub async fn sync_on_render<U: DeserializeOwned>(reconciler: &mut SessionReconciler<U>) {
    sync(Phase::Render, reconciler).await;
}

/// Hydration-time synchronizer.
pub async fn sync_on_hydrate<U: DeserializeOwned>(reconciler: &mut SessionReconciler<U>) {
    sync(Phase::Hydrate, reconciler).await;
}

async fn sync<U: DeserializeOwned>(phase: Phase, reconciler: &mut SessionReconciler<U>) {
    if !needs_sync(reconciler) {
        return;
    }
    match reconciler.fetch_user().await {
        Ok(()) => tracing::debug!(phase = phase.as_str(), logged_in = reconciler.logged_in(), "session synced"),
        Err(e) => tracing::debug!(phase = phase.as_str(), error = %e, "session sync failed, continuing logged out"),
    }
}

// =============================================================================
// SESSION CONTEXTS
// =============================================================================

/// Per-request session context used while rendering on the server.
pub struct RenderSession<U> {
    pub reconciler: SessionReconciler<U>,
    proxy: Arc<InProcessProxy>,
    pub redirect: Arc<PendingRedirect>,
}

impl<U: DeserializeOwned> RenderSession<U> {
    /// Build the context for one request and run the render-time synchronizer.
    pub async fn start(state: &ProxyState, jar: CookieJar) -> Self {
        let present = token_present(&jar, &state.config.public.cookie_name);
        let proxy = Arc::new(InProcessProxy::new(state.clone(), jar));
        let redirect = Arc::new(PendingRedirect::default());
        let mut reconciler =
            SessionReconciler::new(state.config.public.clone(), proxy.clone(), redirect.clone(), present);

        sync_on_render(&mut reconciler).await;
        Self { reconciler, proxy, redirect }
    }

    /// Cookie jar to send with the response, including any eviction.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.proxy.jar()
    }
}

/// Build a client-side reconciler from a render snapshot and run the
/// hydration-time synchronizer against the proxy at `origin`.
///
/// `cookie_header` is the browser's `Cookie` header, forwarded untouched.
///
/// # Errors
///
/// Returns an error only if the HTTP transport cannot be built.
pub async fn hydrate<U: DeserializeOwned>(
    origin: &str,
    config: PublicAuthConfig,
    snapshot: Option<SessionState<U>>,
    cookie_header: Option<&str>,
    navigator: Arc<dyn super::Navigator>,
) -> Result<SessionReconciler<U>, ProxyError> {
    let api = HttpProxyApi::new(origin, &config)?;
    if let Some(header) = cookie_header {
        api.forward_cookie_header(header);
    }
    // A forwarded header is the fresher observation; otherwise trust the snapshot.
    let present = match cookie_header {
        Some(header) => token_present(&jar_from_header(header), &config.cookie_name),
        None => snapshot.as_ref().is_some_and(|s| s.token_present),
    };

    let mut reconciler = SessionReconciler::new(config, Arc::new(api), navigator, present);
    if let Some(state) = snapshot {
        reconciler = reconciler.with_state(state);
        reconciler.set_token_present(present);
    }

    sync_on_hydrate(&mut reconciler).await;
    Ok(reconciler)
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
