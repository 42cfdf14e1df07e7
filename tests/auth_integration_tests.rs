/*!
 * Authentication Integration Tests
 *
 * Covers login (success, wrong password, inactive account, locked account),
 * token refresh, logout, and change-password against a real database.
 */

mod test_utils;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use test_utils::{teardown_test_db, TestApp, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
#[ignore] // requires a running Postgres instance (TEST_DATABASE_URL)
async fn login_with_valid_credentials_returns_tokens() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "login_ok").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": user.password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["tokens"]["access_token"].is_string());
    assert!(body["tokens"]["refresh_token"].is_string());
    assert_eq!(body["user"]["username"], user.username);

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn login_with_wrong_password_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "login_bad_pw").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": "wrong-password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn login_with_deactivated_account_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "login_inactive").await;
    user.deactivate(&pool).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": user.password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn login_with_locked_account_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "login_locked").await;
    user.lock_until(&pool, chrono::Utc::now() + chrono::Duration::minutes(15)).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": user.password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn refresh_with_valid_refresh_token_issues_new_pair() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "refresh_ok").await;

    let login_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": user.password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let login_body = body_json(login_response).await;
    let refresh_token = login_body["tokens"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .body(Body::from(json!({"refresh_token": refresh_token}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["access_token"].is_string());

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn refresh_with_garbage_token_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("content-type", "application/json")
                .body(Body::from(json!({"refresh_token": "not-a-real-token"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn logout_without_bearer_token_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn logout_then_reuse_of_access_token_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;
    let user = TestUser::create_pharmacist(&pool, "logout_then_reuse").await;

    let login_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": user.username, "password": user.password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let login_body = body_json(login_response).await;
    let access_token = login_body["tokens"]["access_token"].as_str().unwrap().to_string();

    let logout_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header("authorization", format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(logout_response.status(), StatusCode::OK);

    let reuse_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/change-password")
                .header("authorization", format!("Bearer {access_token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"current_password": user.password, "new_password": "New-Password-456!"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(reuse_response.status(), StatusCode::UNAUTHORIZED);

    teardown_test_db(&pool).await;
}
