//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The proxy handlers are mounted under `/api` at the configured endpoint
//! paths. The browser only ever talks to these routes; the backend base URL
//! and the token stay on this side. A small server-rendered status page at
//! `/` shows the render-time session sync in action.

pub mod auth;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum_extra::extract::cookie::CookieJar;
use tower_http::trace::TraceLayer;

use crate::config::PublicAuthConfig;
use crate::session::{SessionState, User};
use crate::session::bootstrap::RenderSession;
use crate::state::ProxyState;

/// Proxy routes only, for hosts that merge them into their own router.
pub fn auth_routes(state: ProxyState) -> Router {
    let public = &state.config.public;

    Router::new()
        .route(&public.login_route(), post(auth::login))
        .route(&public.logout_route(), post(auth::logout))
        .route(&public.user_route(), get(auth::user))
        .route(&format!("{}/config", crate::config::PROXY_PREFIX), get(public_config))
        .with_state(state)
}

/// Full application: proxy routes, status page, health check and request tracing.
pub fn app(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .with_state(state.clone())
        .merge(auth_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// `GET /api/config`: the public half of the session config.
async fn public_config(State(state): State<ProxyState>) -> Json<PublicAuthConfig> {
    Json(state.config.public.clone())
}

/// `GET /`: server-rendered status page.
///
/// Runs the render-time sync in-process, so a stale cookie is evicted in
/// this very response.
async fn index(State(state): State<ProxyState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let session = RenderSession::<User>::start(&state, jar).await;
    let html = render_index(session.reconciler.state());
    (session.jar(), Html(html))
}

fn render_index(snapshot: &SessionState<User>) -> String {
    let status = match &snapshot.user {
        Some(user) if snapshot.logged_in() => format!("Signed in as {}", escape_html(&user.username)),
        _ => "Not signed in".to_owned(),
    };
    // Snapshot for the hydration-time sync; `</` is escaped to keep the script tag intact.
    let snapshot = serde_json::to_string(snapshot)
        .unwrap_or_else(|_| "null".to_owned())
        .replace("</", "<\\/");

    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>authbridge</title></head>\
         <body><p id=\"session-status\">{status}</p>\
         <script id=\"session-state\" type=\"application/json\">{snapshot}</script></body></html>"
    )
}

/// Text and attribute escaping for the status page only. Anything richer
/// than this one page should move to a template engine.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
