/*!
 * QR Code Integration Tests
 *
 * Staff-gated issuance, the deliberately public scan endpoint, and the
 * admin-only scan history.
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

async fn create_product(app: &axum::Router, token: &str, sku: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "name": "Metformin 500mg",
                        "sku": sku,
                        "price": 6.0,
                        "cost": 3.0,
                        "stock": 20,
                        "min_stock": 5,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore] // requires a running Postgres instance (TEST_DATABASE_URL)
async fn staff_generates_qr_then_anyone_scans_it() {
    let TestApp { app, pool } = TestApp::new().await;
    let pharmacist = TestUser::create_pharmacist(&pool, "qr_generate").await;
    let token = login(&app, &pharmacist.username, &pharmacist.password).await;
    let product_id = create_product(&app, &token, "SKU-QR-001").await;

    let generate_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/qr/products/{product_id}/generate"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(generate_response.status(), StatusCode::OK);
    let qr = body_json(generate_response).await;
    let code = qr["code"].as_str().unwrap().to_string();

    let scan_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/qr/scan")
                .header("content-type", "application/json")
                .body(Body::from(json!({"code": code, "scan_method": "mobile"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(scan_response.status(), StatusCode::OK);
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn assistant_cannot_generate_product_qr() {
    let TestApp { app, pool } = TestApp::new().await;
    let assistant = TestUser::create_assistant(&pool, "qr_assistant").await;
    let token = login(&app, &assistant.username, &assistant.password).await;
    let pharmacist = TestUser::create_pharmacist(&pool, "qr_assistant_setup").await;
    let setup_token = login(&app, &pharmacist.username, &pharmacist.password).await;
    let product_id = create_product(&app, &setup_token, "SKU-QR-002").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/qr/products/{product_id}/generate"))
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
async fn scanning_an_unknown_code_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/qr/scan")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"code": "v1:product:doesnotexist", "scan_method": "web"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn non_admin_cannot_view_scan_history() {
    let TestApp { app, pool } = TestApp::new().await;
    let pharmacist = TestUser::create_pharmacist(&pool, "qr_history_pharmacist").await;
    let token = login(&app, &pharmacist.username, &pharmacist.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/qr/scan-history")
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
async fn admin_can_view_scan_history() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "qr_history_admin").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/qr/scan-history")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    teardown_test_db(&pool).await;
}
