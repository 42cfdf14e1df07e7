/*!
 * Staff User Management Integration Tests
 *
 * Admin-only account creation/listing/deactivation, plus the
 * self-or-admin rule on GET /users/:id.
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

async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(json!({"username": username, "password": password}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    body["tokens"]["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore] // requires a running Postgres instance (TEST_DATABASE_URL)
async fn admin_can_create_staff_user() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "users_admin_create").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "username": "new_pharmacist",
                        "email": "new_pharmacist@pharmacy.test",
                        "password": "Valid-Password-123!",
                        "role": "PHARMACIST",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["username"], "new_pharmacist");
    assert!(body.get("password_hash").is_none());

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn non_admin_cannot_create_staff_user() {
    let TestApp { app, pool } = TestApp::new().await;
    let assistant = TestUser::create_assistant(&pool, "users_assistant_create").await;
    let token = login(&app, &assistant.username, &assistant.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "username": "should_not_exist",
                        "email": "nope@pharmacy.test",
                        "password": "Valid-Password-123!",
                        "role": "PHARMACIST",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn user_can_fetch_own_profile_without_admin_role() {
    let TestApp { app, pool } = TestApp::new().await;
    let assistant = TestUser::create_assistant(&pool, "users_self_fetch").await;
    let token = login(&app, &assistant.username, &assistant.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/users/{}", assistant.id))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn user_cannot_fetch_another_users_profile() {
    let TestApp { app, pool } = TestApp::new().await;
    let assistant = TestUser::create_assistant(&pool, "users_other_a").await;
    let other = TestUser::create_assistant(&pool, "users_other_b").await;
    let token = login(&app, &assistant.username, &assistant.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/users/{}", other.id))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn admin_can_deactivate_then_reactivate_user() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "users_admin_deact").await;
    let target = TestUser::create_pharmacist(&pool, "users_target_deact").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let deactivate_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/users/{}/deactivate", target.id))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deactivate_response.status(), StatusCode::OK);
    let body = body_json(deactivate_response).await;
    assert_eq!(body["is_active"], false);

    let reactivate_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/users/{}/activate", target.id))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(reactivate_response.status(), StatusCode::OK);
    let body = body_json(reactivate_response).await;
    assert_eq!(body["is_active"], true);

    teardown_test_db(&pool).await;
}
