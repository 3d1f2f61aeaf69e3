//! Session cookie store: the single HttpOnly cookie holding the backend token.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

use crate::config::{CookieOptions, PrivateAuthConfig};

/// Reads and writes the session cookie with the configured scope.
///
/// Writes and removals go through the same attribute set so that a removal
/// always targets the cookie the browser actually stored.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookieStore<'a> {
    name: &'a str,
    options: &'a CookieOptions,
}

impl<'a> SessionCookieStore<'a> {
    #[must_use]
    pub fn new(config: &'a PrivateAuthConfig) -> Self {
        Self { name: &config.cookie_name, options: &config.cookie }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Set the session cookie. `HttpOnly` is forced on regardless of options.
    #[must_use]
    pub fn write(&self, jar: CookieJar, token: impl Into<String>) -> CookieJar {
        jar.add(self.build(token.into(), Duration::seconds(self.options.max_age_secs)))
    }

    /// Expire the session cookie immediately. Clearing an absent cookie is fine.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(String::new(), Duration::ZERO))
    }

    /// Raw token from the jar. An empty value counts as no token.
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        read_token(jar, self.name)
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.to_owned(), value))
            .path(self.options.path.clone())
            .http_only(true)
            .same_site(self.options.same_site)
            .secure(self.options.secure)
            .max_age(max_age);
        if let Some(domain) = &self.options.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

/// Look up a non-empty cookie value by name.
#[must_use]
pub fn read_token(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Parse a raw `Cookie` header, as forwarded from a browser request.
///
/// An invalid header value yields an empty jar.
#[must_use]
pub fn jar_from_header(header: &str) -> CookieJar {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(header) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "ignoring unparseable Cookie header"),
    }
    CookieJar::from_headers(&headers)
}

/// Whether a session cookie appears to exist.
///
/// This is all browser-side code can know about an HttpOnly cookie: that it
/// was sent, not what it holds.
#[must_use]
pub fn token_present(jar: &CookieJar, name: &str) -> bool {
    read_token(jar, name).is_some()
}

#[cfg(test)]
#[path = "cookie_test.rs"]
mod tests;
