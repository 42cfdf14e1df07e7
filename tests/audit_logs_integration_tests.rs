/*!
 * Audit Logs Integration Tests
 *
 * Admin-only audit trail endpoints: listing, statistics, filter options,
 * and RBAC enforcement for non-admin roles.
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
async fn admin_can_list_audit_logs() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "audit_admin").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/audit")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("logs").is_some() || body.get("items").is_some());

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn non_admin_cannot_list_audit_logs() {
    let TestApp { app, pool } = TestApp::new().await;
    let assistant = TestUser::create_assistant(&pool, "audit_assistant").await;
    let token = login(&app, &assistant.username, &assistant.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/audit")
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
async fn admin_can_fetch_statistics() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "audit_stats_admin").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/audit/statistics")
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
async fn filter_options_lists_actions_and_entity_types() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "audit_filter_admin").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/audit/filter-options")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["actions"].is_array());
    assert!(body["entity_types"].is_array());

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn login_is_recorded_in_audit_trail() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "audit_trail_admin").await;
    let _ = login(&app, &admin.username, &admin.password).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE user_id = $1")
        .bind(admin.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(count >= 1);

    teardown_test_db(&pool).await;
}
