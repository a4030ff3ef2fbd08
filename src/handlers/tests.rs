//! # Tests for Handlers
//!
//! This module contains unit tests for API handlers. Validation paths run
//! before any database access, so a disconnected `DatabaseConnection`
//! suffices here; full request flows live in the integration tests.

use crate::config::AppConfig;
use crate::handlers::root;
use crate::models::ServiceInfo;
use crate::server::{AppState, create_app};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode, header::AUTHORIZATION},
    response::Json,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn test_state() -> AppState {
    let config = AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec!["test-token".to_string()],
        ..Default::default()
    };
    AppState::new(config, DatabaseConnection::default())
}

#[tokio::test]
async fn test_root_handler_returns_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "tezlik");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_service_info_serializes_expected_fields() {
    let json_value: Value =
        serde_json::to_value(ServiceInfo::default()).expect("Failed to serialize ServiceInfo");

    assert_eq!(
        json_value.get("service").unwrap().as_str().unwrap(),
        "tezlik"
    );
    assert!(json_value.get("version").is_some());
}

#[tokio::test]
async fn test_resolve_issues_requires_auth() {
    let app = create_app(test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/api/issues/resolve")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ids":[]}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resolve_issues_rejects_wrong_token() {
    let app = create_app(test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/api/issues/resolve")
        .header(AUTHORIZATION, "Bearer wrong-token")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ids":[]}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_history_limit_validation() {
    let state = test_state();

    for bad_limit in [0, 101] {
        let query = super::measurements::HistoryQuery {
            provider_id: None,
            date_from: None,
            date_to: None,
            connection_type: None,
            limit: Some(bad_limit),
            cursor: None,
        };

        let result = super::measurements::list_history(
            State(state.clone()),
            Default::default(),
            Query(query),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_FAILED".into());
    }
}

#[tokio::test]
async fn test_history_invalid_provider_id_validation() {
    let query = super::measurements::HistoryQuery {
        provider_id: Some("not-a-uuid".to_string()),
        date_from: None,
        date_to: None,
        connection_type: None,
        limit: None,
        cursor: None,
    };

    let result = super::measurements::list_history(
        State(test_state()),
        Default::default(),
        Query(query),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "VALIDATION_FAILED".into());
}

#[tokio::test]
async fn test_history_invalid_timestamp_validation() {
    let query = super::measurements::HistoryQuery {
        provider_id: None,
        date_from: Some("not-a-timestamp".to_string()),
        date_to: None,
        connection_type: None,
        limit: None,
        cursor: None,
    };

    let result = super::measurements::list_history(
        State(test_state()),
        Default::default(),
        Query(query),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(err.message.contains("date_from"));
}

#[tokio::test]
async fn test_history_invalid_cursor_validation() {
    let query = super::measurements::HistoryQuery {
        provider_id: None,
        date_from: None,
        date_to: None,
        connection_type: None,
        limit: None,
        cursor: Some("cursor@#$%".to_string()),
    };

    let result = super::measurements::list_history(
        State(test_state()),
        Default::default(),
        Query(query),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "VALIDATION_FAILED".into());
}

#[tokio::test]
async fn test_run_test_connection_type_validation() {
    let request = super::measurements::RunTestRequest {
        connection_type: Some("turbo".to_string()),
    };

    let result = super::measurements::run_test(
        State(test_state()),
        Default::default(),
        Some(Json(request)),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "VALIDATION_FAILED".into());
}

#[tokio::test]
async fn test_feedback_rating_validation() {
    for bad_rating in [-1, 11] {
        let request = super::feedback::SubmitFeedbackRequest {
            rating: bad_rating,
            comment: None,
        };

        let result = super::feedback::submit_feedback(
            State(test_state()),
            Path(Uuid::new_v4()),
            Json(request),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_FAILED".into());
    }
}
