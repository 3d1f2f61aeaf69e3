use super::*;
use std::sync::Mutex;

// from_env reads fixed variable names, so tests touching them are serialized.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const AUTH_VARS: &[&str] = &[
    "AUTH_API_BASE_URL",
    "AUTH_LOGIN_ENDPOINT",
    "AUTH_LOGOUT_ENDPOINT",
    "AUTH_USER_ENDPOINT",
    "AUTH_COOKIE_NAME",
    "AUTH_COOKIE_PATH",
    "AUTH_COOKIE_MAX_AGE_SECS",
    "AUTH_COOKIE_SAME_SITE",
    "AUTH_COOKIE_SECURE",
    "AUTH_COOKIE_DOMAIN",
    "AUTH_REDIRECT_ON_LOGOUT",
    "AUTH_REQUEST_TIMEOUT_SECS",
    "AUTH_CONNECT_TIMEOUT_SECS",
];

/// # Safety
/// Callers hold `ENV_LOCK`.
unsafe fn clear_auth_env() {
    for key in AUTH_VARS {
        unsafe { std::env::remove_var(key) };
    }
}

// =============================================================================
// from_env
// =============================================================================

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_API_BASE_URL", "http://localhost:3001/");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.private.api_base_url, "http://localhost:3001");
    assert_eq!(cfg.public.login_endpoint, "/auth/login");
    assert_eq!(cfg.public.logout_endpoint, "/auth/logout");
    assert_eq!(cfg.public.user_endpoint, "/auth/user");
    assert_eq!(cfg.public.cookie_name, "auth-token");
    assert_eq!(cfg.private.cookie_name, "auth-token");
    assert_eq!(cfg.public.redirect_on_logout, "/");
    assert_eq!(cfg.private.cookie, CookieOptions::default());
    assert_eq!(cfg.private.cookie.max_age_secs, 604_800);
    assert_eq!(cfg.private.timeouts, BackendTimeouts { request_secs: 30, connect_secs: 10 });

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_missing_base_url_is_not_fatal() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_auth_env() };

    let cfg = AuthConfig::from_env().unwrap();
    assert!(cfg.private.api_base_url.is_empty());
    assert!(matches!(cfg.backend_url("/auth/login"), Err(AuthError::Config(_))));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_API_BASE_URL", "https://backend.test/api");
        std::env::set_var("AUTH_LOGIN_ENDPOINT", "v1/login");
        std::env::set_var("AUTH_USER_ENDPOINT", "/v1/me");
        std::env::set_var("AUTH_COOKIE_NAME", "myapp-session");
        std::env::set_var("AUTH_COOKIE_PATH", "/app");
        std::env::set_var("AUTH_COOKIE_MAX_AGE_SECS", "3600");
        std::env::set_var("AUTH_COOKIE_SAME_SITE", "Strict");
        std::env::set_var("AUTH_COOKIE_SECURE", "yes");
        std::env::set_var("AUTH_COOKIE_DOMAIN", "example.test");
        std::env::set_var("AUTH_REDIRECT_ON_LOGOUT", "/login");
        std::env::set_var("AUTH_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("AUTH_CONNECT_TIMEOUT_SECS", "2");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.public.login_endpoint, "/v1/login");
    assert_eq!(cfg.public.user_endpoint, "/v1/me");
    assert_eq!(cfg.public.cookie_name, "myapp-session");
    assert_eq!(cfg.private.cookie_name, "myapp-session");
    assert_eq!(cfg.public.redirect_on_logout, "/login");
    assert_eq!(cfg.private.cookie.path, "/app");
    assert_eq!(cfg.private.cookie.max_age_secs, 3600);
    assert_eq!(cfg.private.cookie.same_site, SameSite::Strict);
    assert!(cfg.private.cookie.secure);
    assert_eq!(cfg.private.cookie.domain.as_deref(), Some("example.test"));
    assert_eq!(cfg.private.timeouts, BackendTimeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.backend_url(&cfg.public.user_endpoint).unwrap(), "https://backend.test/api/v1/me");

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_unknown_same_site_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_COOKIE_SAME_SITE", "sometimes");
    }

    let err = AuthConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("AUTH_COOKIE_SAME_SITE"));

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_bad_number_falls_back_to_default() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_COOKIE_MAX_AGE_SECS", "a week");
    }

    let cfg = AuthConfig::from_env().unwrap();
    assert_eq!(cfg.private.cookie.max_age_secs, DEFAULT_COOKIE_MAX_AGE_SECS);

    unsafe { clear_auth_env() };
}

// =============================================================================
// env_bool: unique variable names, no lock needed.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on", " TRUE "].iter().enumerate() {
        let key = format!("__TEST_AUTH_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "off"].iter().enumerate() {
        let key = format!("__TEST_AUTH_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_or_unset_returns_none() {
    let key = "__TEST_AUTH_EB_INVALID_5512__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_AUTH_EB_SURELY_UNSET_77__"), None);
}

// =============================================================================
// builder
// =============================================================================

#[test]
fn builder_keeps_cookie_name_in_both_halves() {
    let cfg = AuthConfig::new("http://b").with_cookie_name("sid");
    assert_eq!(cfg.public.cookie_name, "sid");
    assert_eq!(cfg.private.cookie_name, "sid");
}

#[test]
fn proxy_routes_are_prefixed() {
    let cfg = AuthConfig::new("http://b").with_logout_endpoint("auth/bye");
    assert_eq!(cfg.public.login_route(), "/api/auth/login");
    assert_eq!(cfg.public.logout_route(), "/api/auth/bye");
    assert_eq!(cfg.public.user_route(), "/api/auth/user");
}

#[test]
fn public_config_serializes_without_private_fields() {
    let cfg = AuthConfig::new("https://secret-backend.internal");
    let json = serde_json::to_string(&cfg.public).unwrap();
    assert!(json.contains("\"loginEndpoint\":\"/auth/login\""));
    assert!(json.contains("\"redirectOnLogout\":\"/\""));
    assert!(!json.contains("secret-backend"));
    assert!(!json.contains("maxAge"));
}
