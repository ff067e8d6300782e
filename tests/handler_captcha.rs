mod common;

use axum_test::TestServer;
use linkgate::api::routes::public_routes;
use linkgate::domain::entities::SecurityMode;
use serde_json::{Value, json};
use std::sync::Arc;

fn test_server(state: linkgate::AppState) -> TestServer {
    TestServer::new(public_routes().with_state(state)).unwrap()
}

#[tokio::test]
async fn test_verify_captcha_accepts_valid_token() {
    let (state, _handles) = common::create_test_state_with_captcha(
        SecurityMode::Blacklist,
        Arc::new(common::StaticCaptchaVerifier::accepting("good-token")),
    );

    let server = test_server(state);
    let response = server
        .post("/verify-captcha")
        .json(&json!({ "token": "good-token" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["verified"], true);
}

#[tokio::test]
async fn test_verify_captcha_rejects_invalid_token() {
    let (state, _handles) = common::create_test_state_with_captcha(
        SecurityMode::Blacklist,
        Arc::new(common::StaticCaptchaVerifier::accepting("good-token")),
    );

    let server = test_server(state);
    let response = server
        .post("/verify-captcha")
        .json(&json!({ "token": "stale-token" }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_verify_captcha_empty_token_is_bad_request() {
    let (state, _handles) = common::create_test_state(SecurityMode::Blacklist);

    let server = test_server(state);
    let response = server
        .post("/verify-captcha")
        .json(&json!({ "token": "" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_captcha_enabled_reflected_in_visit_info() {
    let (state, handles) = common::create_test_state_with_captcha(
        SecurityMode::Blacklist,
        Arc::new(common::StaticCaptchaVerifier::accepting("good-token")),
    );
    common::create_test_link(&handles.links, "promo", "https://example.com").await;

    let server = test_server(state);
    let body: Value = server.get("/visit/promo").await.json();

    assert_eq!(body["captcha_enabled"], true);
}
