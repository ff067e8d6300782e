mod common;

use axum_test::TestServer;
use linkgate::api::routes::public_routes;
use linkgate::domain::entities::SecurityMode;
use serde_json::{Value, json};

fn test_server(state: linkgate::AppState) -> TestServer {
    TestServer::new(public_routes().with_state(state)).unwrap()
}

#[tokio::test]
async fn test_check_domain_blacklist_blocks_match() {
    let (state, handles) = common::create_test_state(SecurityMode::Blacklist);
    common::create_rule(&handles.rules, "bad.com", SecurityMode::Blacklist).await;

    let server = test_server(state);
    let response = server
        .post("/check-domain")
        .json(&json!({ "url": "https://bad.com/page" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["domain"], "bad.com");
    assert_eq!(body["security_mode"], "blacklist");
}

#[tokio::test]
async fn test_check_domain_subdomain_rule_semantics() {
    let (state, handles) = common::create_test_state(SecurityMode::Blacklist);
    common::create_rule(&handles.rules, "bad.com", SecurityMode::Blacklist).await;

    let server = test_server(state);

    // Apex rule covers subdomains.
    let sub: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://api.bad.com" }))
        .await
        .json();
    assert_eq!(sub["allowed"], false);

    // Unrelated suffix does not match.
    let sibling: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://notbad.com" }))
        .await
        .json();
    assert_eq!(sibling["allowed"], true);
}

#[tokio::test]
async fn test_check_domain_wildcard_excludes_apex() {
    let (state, handles) = common::create_test_state(SecurityMode::Blacklist);
    common::create_rule(&handles.rules, "*.tracker.io", SecurityMode::Blacklist).await;

    let server = test_server(state);

    let sub: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://ads.tracker.io" }))
        .await
        .json();
    assert_eq!(sub["allowed"], false);

    let apex: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://tracker.io" }))
        .await
        .json();
    assert_eq!(apex["allowed"], true);
}

#[tokio::test]
async fn test_check_domain_whitelist_mode() {
    let (state, handles) = common::create_test_state(SecurityMode::Whitelist);
    common::create_rule(&handles.rules, "example.com", SecurityMode::Whitelist).await;

    let server = test_server(state);

    let listed: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://example.com" }))
        .await
        .json();
    assert_eq!(listed["allowed"], true);
    assert_eq!(listed["security_mode"], "whitelist");

    let unlisted: Value = server
        .post("/check-domain")
        .json(&json!({ "url": "https://other.com" }))
        .await
        .json();
    assert_eq!(unlisted["allowed"], false);
    assert_eq!(unlisted["reason"], "no whitelist rule matched");
}

#[tokio::test]
async fn test_check_domain_invalid_url_is_bad_request() {
    let (state, _handles) = common::create_test_state(SecurityMode::Blacklist);

    let server = test_server(state);
    let response = server
        .post("/check-domain")
        .json(&json!({ "url": "not a url" }))
        .await;

    response.assert_status_bad_request();
}
