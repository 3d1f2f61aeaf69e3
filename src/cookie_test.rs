use super::*;
use crate::config::AuthConfig;
use axum_extra::extract::cookie::SameSite;

fn private_config() -> PrivateAuthConfig {
    AuthConfig::new("http://backend.test").private
}

#[test]
fn write_sets_http_only_scoped_cookie() {
    let config = private_config();
    let store = SessionCookieStore::new(&config);
    let jar = store.write(CookieJar::new(), "T1");

    let cookie = jar.get("auth-token").unwrap();
    assert_eq!(cookie.value(), "T1");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    assert_eq!(store.read(&jar).as_deref(), Some("T1"));
}

#[test]
fn write_forces_http_only_even_when_disabled() {
    let mut config = private_config();
    config.cookie.http_only = false;
    let store = SessionCookieStore::new(&config);
    let jar = store.write(CookieJar::new(), "T1");
    assert_eq!(jar.get("auth-token").unwrap().http_only(), Some(true));
}

#[test]
fn clear_uses_same_scope_and_zero_max_age() {
    let mut config = private_config();
    config.cookie.path = "/app".into();
    config.cookie.domain = Some("example.test".into());
    config.cookie.same_site = SameSite::Strict;
    let store = SessionCookieStore::new(&config);

    let jar = store.clear(store.write(CookieJar::new(), "T1"));
    let cookie = jar.get("auth-token").unwrap();
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.path(), Some("/app"));
    assert_eq!(cookie.domain(), Some("example.test"));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert!(store.read(&jar).is_none());
}

#[test]
fn clear_on_empty_jar_is_not_an_error() {
    let config = private_config();
    let store = SessionCookieStore::new(&config);
    let jar = store.clear(CookieJar::new());
    assert!(store.read(&jar).is_none());
    assert_eq!(jar.get("auth-token").unwrap().max_age(), Some(Duration::ZERO));
}

#[test]
fn read_token_ignores_empty_and_foreign_cookies() {
    let jar = CookieJar::new().add(Cookie::new("auth-token", "")).add(Cookie::new("other", "x"));
    assert!(read_token(&jar, "auth-token").is_none());
    assert!(!token_present(&jar, "auth-token"));
    assert!(token_present(&jar, "other"));
}

#[test]
fn custom_cookie_name_is_used() {
    let config = AuthConfig::new("http://backend.test").with_cookie_name("sid").private;
    let store = SessionCookieStore::new(&config);
    let jar = store.write(CookieJar::new(), "abc");
    assert_eq!(store.name(), "sid");
    assert!(jar.get("auth-token").is_none());
    assert_eq!(read_token(&jar, "sid").as_deref(), Some("abc"));
}

#[test]
fn jar_from_header_parses_forwarded_cookies() {
    let jar = jar_from_header("theme=dark; auth-token=T1");
    assert_eq!(read_token(&jar, "auth-token").as_deref(), Some("T1"));
    assert_eq!(read_token(&jar, "theme").as_deref(), Some("dark"));
}

#[test]
fn token_present_on_forwarded_header() {
    assert!(token_present(&jar_from_header("auth-token=T1"), "auth-token"));
    assert!(!token_present(&jar_from_header("auth-token="), "auth-token"));
    assert!(!token_present(&jar_from_header("other-auth-token=T1"), "auth-token"));
    assert!(!token_present(&jar_from_header(""), "auth-token"));
}

#[test]
fn jar_from_invalid_header_is_empty() {
    let jar = jar_from_header("auth-token=T1\n");
    assert!(jar.iter().next().is_none());
}
