//! 注册与登录 API 集成测试

use account_service::repository::UserRepository;
use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{create_test_app, login, register, send};

#[tokio::test]
async fn test_register_success() {
    let app = create_test_app().await;

    let (status, json) = register(&app.router, "alice@example.com", "secret123").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "User successfully created");
    assert_eq!(json["user"], "alice@example.com");
}

#[tokio::test]
async fn test_registered_user_is_never_superadmin() {
    let app = create_test_app().await;

    // 请求体中夹带的超级管理员字段会被忽略
    let (status, _) = send(
        &app.router,
        "POST",
        "/register/",
        None,
        Some(json!({
            "email": "sneaky@example.com",
            "password": "secret123",
            "is_superadmin": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let user = app.repo.find_by_email("sneaky@example.com").await.unwrap().unwrap();
    assert!(!user.is_superadmin);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_test_app().await;

    let (status, _) = register(&app.router, "alice@example.com", "secret123").await;
    assert_eq!(status, StatusCode::CREATED);

    // 载荷不同也一样
    for password in ["secret123", "another-password", "x"] {
        let (status, json) = register(&app.router, "alice@example.com", password).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Email already registered");
    }

    assert_eq!(app.repo.len().await, 2); // root + alice
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = create_test_app().await;

    let (status, _) = register(&app.router, "not-an-email", "secret123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.repo.find_by_email("not-an-email").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_success() {
    let app = create_test_app().await;
    register(&app.router, "alice@example.com", "secret123").await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/login/",
        None,
        Some(json!({ "email": "alice@example.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "User successfully logged in");
    assert_eq!(json["token_type"], "bearer");

    let token = json["access_token"].as_str().unwrap();
    let claims = app.state.jwt_service.verify_token(token).unwrap();
    assert_eq!(claims.sub, "alice@example.com");
    assert!(!claims.is_superadmin);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = create_test_app().await;
    register(&app.router, "alice@example.com", "secret123").await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/login/",
        None,
        Some(json!({ "email": "alice@example.com", "password": "WrongPassword" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_user_not_found() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/login/",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_superadmin_login_carries_flag() {
    let app = create_test_app().await;

    let token = login(&app.router, common::ROOT_EMAIL, common::ROOT_PASSWORD).await;
    let claims = app.state.jwt_service.verify_token(&token).unwrap();
    assert!(claims.is_superadmin);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/register/",
        None,
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], 400);
    assert!(json["error"]["message"].as_str().unwrap().contains("password"));

    // 没有 Content-Type 和请求体
    let (status, json) = send(&app.router, "POST", "/login/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["request_id"].is_string());

    assert!(app.repo.find_by_email("alice@example.com").await.unwrap().is_none());
}
