use super::*;
use serde_json::json;

#[test]
fn rejected_extracts_backend_message() {
    let err = BackendError::rejected(403, Some(json!({"message": "account locked", "code": 7})));
    assert_eq!(err.status, Some(403));
    assert_eq!(err.message.as_deref(), Some("account locked"));
    assert!(!err.is_unauthorized());
}

#[test]
fn rejected_without_message_field() {
    let err = BackendError::rejected(401, Some(json!({"error": "nope"})));
    assert!(err.message.is_none());
    assert!(err.is_unauthorized());
}

#[test]
fn from_backend_passes_status_and_message_through() {
    let err = AuthError::from_backend(
        BackendError::rejected(403, Some(json!({"message": "account locked"}))),
        "Login failed",
    );
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(err.public_message(), "account locked");
    assert_eq!(err.body().data, Some(json!({"message": "account locked"})));
}

#[test]
fn from_backend_uses_fallback_message() {
    let err = AuthError::from_backend(BackendError::rejected(422, None), "Login failed");
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.public_message(), "Login failed");
}

#[test]
fn unreachable_backend_maps_to_500() {
    let err = AuthError::from_backend(BackendError::unreachable("connection refused"), "Failed to fetch user");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "Failed to fetch user");
}

#[test]
fn config_and_unauthorized_statuses() {
    assert_eq!(AuthError::Config("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(AuthError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::InvalidBody("x".into()).status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn error_body_uses_camel_case() {
    let body = AuthError::Unauthorized("Not authenticated: No token found".into()).body();
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["statusCode"], 401);
    assert_eq!(value["message"], "Not authenticated: No token found");
    assert!(value["data"].is_null());
}

#[tokio::test]
async fn into_response_renders_json_body() {
    let resp = AuthError::Backend { status: 418, message: "teapot".into(), payload: None }.into_response();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.status_code, 418);
    assert_eq!(body.message, "teapot");
}
