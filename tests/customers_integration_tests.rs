/*!
 * Customer Integration Tests
 *
 * CRUD over customers, including the encrypted-field round-trip and the
 * senior-citizen/PWD discount flags.
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
async fn staff_can_create_and_fetch_customer() {
    let TestApp { app, pool } = TestApp::new().await;
    let pharmacist = TestUser::create_pharmacist(&pool, "customers_create").await;
    let token = login(&app, &pharmacist.username, &pharmacist.password).await;

    let create_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/customers")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "first_name": "Juana",
                        "last_name": "Dela Cruz",
                        "email": "juana@example.com",
                        "allergies": ["penicillin"],
                        "is_senior_citizen": true,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(create_response.status(), StatusCode::CREATED);
    let created = body_json(create_response).await;
    let customer_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["first_name"], "Juana");
    assert_eq!(created["allergies"][0], "penicillin");

    let get_response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/customers/{customer_id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let fetched = body_json(get_response).await;
    assert_eq!(fetched["id"], customer_id);
    assert_eq!(fetched["is_senior_citizen"], true);

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn create_customer_without_auth_is_rejected() {
    let TestApp { app, pool } = TestApp::new().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/customers")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"first_name": "No", "last_name": "Auth"}).to_string(),
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
async fn update_customer_persists_changes() {
    let TestApp { app, pool } = TestApp::new().await;
    let pharmacist = TestUser::create_pharmacist(&pool, "customers_update").await;
    let token = login(&app, &pharmacist.username, &pharmacist.password).await;

    let create_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/customers")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"first_name": "Pedro", "last_name": "Santos"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = body_json(create_response).await;
    let customer_id = created["id"].as_str().unwrap().to_string();

    let update_response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/customers/{customer_id}"))
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"phone": "0917-555-0101"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(update_response.status(), StatusCode::OK);
    let updated = body_json(update_response).await;
    assert_eq!(updated["phone"], "0917-555-0101");
    assert_eq!(updated["first_name"], "Pedro");

    teardown_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn delete_customer_then_get_returns_not_found() {
    let TestApp { app, pool } = TestApp::new().await;
    let admin = TestUser::create_admin(&pool, "customers_delete_admin").await;
    let token = login(&app, &admin.username, &admin.password).await;

    let create_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/customers")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"first_name": "Delete", "last_name": "Me"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = body_json(create_response).await;
    let customer_id = created["id"].as_str().unwrap().to_string();

    let delete_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/customers/{customer_id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::NO_CONTENT);

    let get_response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/customers/{customer_id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);

    teardown_test_db(&pool).await;
}
