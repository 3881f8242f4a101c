//! Tests for `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use satprep_api::error::AppError;
use satprep_core::error::CoreError;
use satprep_db::StoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn unauthorized_has_a_bare_message() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("bad secret".into()))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, serde_json::json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn configuration_error_returns_500_with_message() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Configuration(
        "Missing database configuration (DATABASE_URL)".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Missing database configuration (DATABASE_URL)");
}

#[tokio::test]
async fn store_error_returns_500_with_message() {
    let (status, json) =
        error_to_response(AppError::Store(StoreError::Unavailable("directory down".into())))
            .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Store unavailable: directory down");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Validation("focus out of range".into())))
            .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "focus out of range");
}

#[tokio::test]
async fn body_has_only_the_error_key() {
    let (_, json) = error_to_response(AppError::BadRequest("nope".into())).await;
    assert_eq!(json.as_object().unwrap().len(), 1);
}
