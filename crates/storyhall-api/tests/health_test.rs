//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["stats"]["sessions"], 0);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_test_app();

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_created_session_is_listed() {
    let app = common::build_test_app();

    let (status, created) = common::post_empty(app.clone(), "/api/session/create").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        created["joinUrl"],
        format!("http://localhost:3000/join/{}", created["sessionId"].as_str().unwrap())
    );

    let (status, sessions) = common::get_json(app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions[0]["sessionId"], created["sessionId"]);
}
