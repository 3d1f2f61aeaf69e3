//! Session configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Configuration is resolved once at startup and shared read-only. It is split
//! in two halves: [`PublicAuthConfig`] carries what browser code may see
//! (endpoint paths, cookie name, logout redirect), while
//! [`PrivateAuthConfig`] holds the backend base URL and the cookie write
//! attributes, which only server-side handlers ever read.

use axum_extra::extract::cookie::SameSite;
use serde::Serialize;

use crate::error::AuthError;

pub const DEFAULT_LOGIN_ENDPOINT: &str = "/auth/login";
pub const DEFAULT_LOGOUT_ENDPOINT: &str = "/auth/logout";
pub const DEFAULT_USER_ENDPOINT: &str = "/auth/user";
pub const DEFAULT_COOKIE_NAME: &str = "auth-token";
pub const DEFAULT_COOKIE_PATH: &str = "/";
pub const DEFAULT_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;
pub const DEFAULT_REDIRECT_ON_LOGOUT: &str = "/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Prefix under which the proxy handlers are mounted.
pub const PROXY_PREFIX: &str = "/api";

// =============================================================================
// COOKIE OPTIONS
// =============================================================================

/// Attributes used when writing and clearing the session cookie.
///
/// The same value is used for both operations: a browser only deletes a
/// cookie when path, domain and same-site match the original scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub max_age_secs: i64,
    /// Always forced to `true` when the cookie is written.
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
    pub domain: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: DEFAULT_COOKIE_PATH.into(),
            max_age_secs: DEFAULT_COOKIE_MAX_AGE_SECS,
            http_only: true,
            same_site: SameSite::Lax,
            secure: false,
            domain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

// =============================================================================
// PUBLIC / PRIVATE HALVES
// =============================================================================

/// Options that are safe to hand to browser code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAuthConfig {
    pub login_endpoint: String,
    pub logout_endpoint: String,
    pub user_endpoint: String,
    pub cookie_name: String,
    pub redirect_on_logout: String,
}

impl PublicAuthConfig {
    /// Proxy route for the login handler, e.g. `/api/auth/login`.
    #[must_use]
    pub fn login_route(&self) -> String {
        format!("{PROXY_PREFIX}{}", self.login_endpoint)
    }

    #[must_use]
    pub fn logout_route(&self) -> String {
        format!("{PROXY_PREFIX}{}", self.logout_endpoint)
    }

    #[must_use]
    pub fn user_route(&self) -> String {
        format!("{PROXY_PREFIX}{}", self.user_endpoint)
    }
}

/// Server-only options. Never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateAuthConfig {
    /// Backend root URL without trailing slash. Empty means "not configured".
    pub api_base_url: String,
    pub cookie_name: String,
    pub cookie: CookieOptions,
    pub timeouts: BackendTimeouts,
}

/// Fully resolved session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub public: PublicAuthConfig,
    pub private: PrivateAuthConfig,
}

impl AuthConfig {
    /// Create a config with every option at its default.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            public: PublicAuthConfig {
                login_endpoint: DEFAULT_LOGIN_ENDPOINT.into(),
                logout_endpoint: DEFAULT_LOGOUT_ENDPOINT.into(),
                user_endpoint: DEFAULT_USER_ENDPOINT.into(),
                cookie_name: DEFAULT_COOKIE_NAME.into(),
                redirect_on_logout: DEFAULT_REDIRECT_ON_LOGOUT.into(),
            },
            private: PrivateAuthConfig {
                api_base_url: normalize_base_url(&api_base_url.into()),
                cookie_name: DEFAULT_COOKIE_NAME.into(),
                cookie: CookieOptions::default(),
                timeouts: BackendTimeouts::default(),
            },
        }
    }

    /// Build typed session config from environment variables.
    ///
    /// Required (checked lazily, at handler entry):
    /// - `AUTH_API_BASE_URL`
    ///
    /// Optional:
    /// - `AUTH_LOGIN_ENDPOINT` / `AUTH_LOGOUT_ENDPOINT` / `AUTH_USER_ENDPOINT`
    /// - `AUTH_COOKIE_NAME`: default `auth-token`
    /// - `AUTH_COOKIE_PATH`: default `/`
    /// - `AUTH_COOKIE_MAX_AGE_SECS`: default 7 days
    /// - `AUTH_COOKIE_SAME_SITE`: `lax` (default), `strict` or `none`
    /// - `AUTH_COOKIE_SECURE`: boolean, default false
    /// - `AUTH_COOKIE_DOMAIN`
    /// - `AUTH_REDIRECT_ON_LOGOUT`: default `/`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if an enumerated option has an unknown value.
    pub fn from_env() -> Result<Self, AuthError> {
        let mut config = Self::new(std::env::var("AUTH_API_BASE_URL").unwrap_or_default());

        if let Ok(v) = std::env::var("AUTH_LOGIN_ENDPOINT") {
            config = config.with_login_endpoint(v);
        }
        if let Ok(v) = std::env::var("AUTH_LOGOUT_ENDPOINT") {
            config = config.with_logout_endpoint(v);
        }
        if let Ok(v) = std::env::var("AUTH_USER_ENDPOINT") {
            config = config.with_user_endpoint(v);
        }
        if let Ok(v) = std::env::var("AUTH_COOKIE_NAME") {
            config = config.with_cookie_name(v);
        }
        if let Ok(v) = std::env::var("AUTH_REDIRECT_ON_LOGOUT") {
            config = config.with_redirect_on_logout(v);
        }

        let mut cookie = CookieOptions::default();
        if let Ok(v) = std::env::var("AUTH_COOKIE_PATH") {
            cookie.path = v;
        }
        cookie.max_age_secs = env_parse("AUTH_COOKIE_MAX_AGE_SECS", DEFAULT_COOKIE_MAX_AGE_SECS);
        cookie.same_site = parse_same_site(std::env::var("AUTH_COOKIE_SAME_SITE").ok().as_deref())?;
        cookie.secure = env_bool("AUTH_COOKIE_SECURE").unwrap_or(false);
        cookie.domain = std::env::var("AUTH_COOKIE_DOMAIN").ok().filter(|d| !d.is_empty());
        config = config.with_cookie_options(cookie);

        config.private.timeouts = BackendTimeouts {
            request_secs: env_parse("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        if config.private.api_base_url.is_empty() {
            tracing::warn!("AUTH_API_BASE_URL is not set; auth proxy routes will fail until configured");
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_login_endpoint(mut self, path: impl Into<String>) -> Self {
        self.public.login_endpoint = normalize_endpoint(&path.into());
        self
    }

    #[must_use]
    pub fn with_logout_endpoint(mut self, path: impl Into<String>) -> Self {
        self.public.logout_endpoint = normalize_endpoint(&path.into());
        self
    }

    #[must_use]
    pub fn with_user_endpoint(mut self, path: impl Into<String>) -> Self {
        self.public.user_endpoint = normalize_endpoint(&path.into());
        self
    }

    /// Cookie name is shared by both halves: the server writes it, the
    /// client only checks for its presence.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.public.cookie_name.clone_from(&name);
        self.private.cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.private.cookie = options;
        self
    }

    #[must_use]
    pub fn with_redirect_on_logout(mut self, path: impl Into<String>) -> Self {
        self.public.redirect_on_logout = path.into();
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: BackendTimeouts) -> Self {
        self.private.timeouts = timeouts;
        self
    }

    /// Backend URL for a given endpoint path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if no base URL is configured.
    pub fn backend_url(&self, endpoint: &str) -> Result<String, AuthError> {
        if self.private.api_base_url.is_empty() {
            return Err(AuthError::Config("Auth API base URL not configured".into()));
        }
        Ok(format!("{}{endpoint}", self.private.api_base_url))
    }
}

// =============================================================================
// PARSING HELPERS
// =============================================================================

/// Parse a boolean-ish environment variable.
pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_same_site(raw: Option<&str>) -> Result<SameSite, AuthError> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref().unwrap_or("lax") {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => Ok(SameSite::None),
        other => Err(AuthError::Config(format!(
            "unsupported AUTH_COOKIE_SAME_SITE '{other}' (expected 'lax', 'strict' or 'none')"
        ))),
    }
}

fn normalize_endpoint(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
