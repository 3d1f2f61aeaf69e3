//! # authbridge
//!
//! Session-authentication bridge between a browser application and a remote
//! bearer-token auth backend. The backend token lives only in a first-party
//! HttpOnly cookie; proxy routes attach it to upstream calls, and a session
//! reconciler keeps a cached "current user" view in line with the cookie.

pub mod config;
pub mod cookie;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod upstream;

pub use config::{AuthConfig, CookieOptions, PrivateAuthConfig, PublicAuthConfig};
pub use error::{AuthError, BackendError};
pub use routes::{app, auth_routes};
pub use session::{SessionReconciler, SessionState, User};
pub use state::ProxyState;
pub use upstream::{AuthBackend, HttpAuthBackend};
