//! Integration tests for the Agegate API endpoints
//!
//! These tests verify the REST endpoints including end-to-end webhook
//! verification flows against the in-memory store.

use agegate_api::{create_router, AppState, NoopPushGateway, WebhookCredentials};
use agegate_store::MemoryStore;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use base64::Engine;
use serde_json::json;
use std::sync::Arc;

/// Create test server backed by the in-memory store
fn create_test_server() -> TestServer {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoopPushGateway),
        WebhookCredentials::new("hook", "secret"),
    );
    TestServer::new(create_router(state)).unwrap()
}

/// Authorization header matching the test webhook credentials
fn webhook_auth() -> HeaderValue {
    basic_auth("hook", "secret")
}

fn basic_auth(username: &str, password: &str) -> HeaderValue {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap()
}

/// Create a user with every tracked profile field populated
async fn create_full_user(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "username": "casey",
            "email": "casey@example.com",
            "display_name": "Casey",
            "avatar": "https://cdn.example.com/avatars/casey.png",
            "bio": "Parent of two",
            "date_of_birth": "1987-03-14",
            "account_type": "anonymous"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["user_id"].as_str().unwrap().to_string()
}

/// Start a verification attempt and return its session id
async fn start_verification(server: &TestServer, user_id: &str) -> String {
    let response = server
        .post("/api/v1/verifications")
        .json(&json!({
            "user_id": user_id,
            "date_of_birth": "1987-03-14"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["session_id"].as_str().unwrap().to_string()
}

fn approved_webhook(session_id: &str) -> serde_json::Value {
    json!({
        "EventType": "KycIdentification.Approved",
        "Payload": {
            "Id": "ident-1",
            "ExternalReferenceId": session_id,
            "Status": "Approved",
            "VerificationData": {
                "DateOfBirth": "1987-03-14",
                "Age": 39,
                "DocumentType": "IdCard",
                "DocumentNumber": "AB123456",
                "FirstName": "Casey",
                "LastName": "Example"
            },
            "RejectionReasons": null
        }
    })
}

fn rejected_webhook(session_id: &str, reasons: &[&str]) -> serde_json::Value {
    json!({
        "EventType": "KycIdentification.Rejected",
        "Payload": {
            "Id": "ident-1",
            "ExternalReferenceId": session_id,
            "Status": "Rejected",
            "VerificationData": null,
            "RejectionReasons": reasons
        }
    })
}

// ============ Health Endpoint Tests ============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_ready_check() {
    let server = create_test_server();

    let response = server.get("/ready").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_stats_start_empty() {
    let server = create_test_server();

    let response = server.get("/api/v1/stats").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total_attempts"], 0);
    assert_eq!(body["total_users"], 0);
    assert_eq!(body["total_notifications"], 0);
}

// ============ User Endpoint Tests ============

#[tokio::test]
async fn test_create_and_get_user() {
    let server = create_test_server();

    let response = server.post("/api/v1/users").json(&json!({})).await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let user_id = body["user_id"].as_str().unwrap();
    assert_eq!(body["account_type"], "anonymous");
    assert_eq!(body["age_verification_status"], "unverified");
    assert_eq!(body["profile_completion"], 0);
    assert_eq!(body["onboarding_complete"], false);
    assert_eq!(body["has_device_token"], false);

    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;

    response.assert_status_ok();
    let get_body: serde_json::Value = response.json();
    assert_eq!(get_body["user_id"], user_id);
}

#[tokio::test]
async fn test_create_user_counts_filled_fields() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "username": "casey",
            "email": "casey@example.com",
            "display_name": "Casey"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    // 3 of 7 tracked fields
    assert_eq!(body["profile_completion"], 43);
    assert_eq!(body["onboarding_complete"], false);
}

#[tokio::test]
async fn test_create_user_invalid_account_type() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "account_type": "corporate" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_user_not_found() {
    let server = create_test_server();

    let response = server.get("/api/v1/users/nonexistent_user").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_register_device_token() {
    let server = create_test_server();
    let user_id = create_full_user(&server).await;

    let response = server
        .put(&format!("/api/v1/users/{}/device-token", user_id))
        .json(&json!({ "device_token": "expo-token-123" }))
        .await;

    response.assert_status(StatusCode::NO_CONTENT);

    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["has_device_token"], true);
    // The raw token never appears in responses
    assert!(body.get("device_token").is_none());
}

#[tokio::test]
async fn test_register_device_token_unknown_user() {
    let server = create_test_server();

    let response = server
        .put("/api/v1/users/nonexistent_user/device-token")
        .json(&json!({ "device_token": "expo-token-123" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_list_notifications_unknown_user() {
    let server = create_test_server();

    let response = server
        .get("/api/v1/users/nonexistent_user/notifications")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_list_notifications_empty() {
    let server = create_test_server();
    let user_id = create_full_user(&server).await;

    let response = server
        .get(&format!("/api/v1/users/{}/notifications", user_id))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

// ============ Verification Endpoint Tests ============

#[tokio::test]
async fn test_start_verification_unknown_user() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/verifications")
        .json(&json!({ "user_id": "nonexistent_user" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_start_verification_marks_profile_pending() {
    let server = create_test_server();
    let user_id = create_full_user(&server).await;

    let response = server
        .post("/api/v1/verifications")
        .json(&json!({
            "user_id": user_id,
            "verification_url": "https://idv.example.com/session/abc"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["method"], "ondato");
    assert_eq!(body["user_id"], user_id);
    assert_eq!(
        body["verification_url"],
        "https://idv.example.com/session/abc"
    );
    assert!(body["session_id"].as_str().is_some());
    assert!(body["expires_at"].as_str().is_some());

    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
    response.assert_status_ok();
    let user_body: serde_json::Value = response.json();
    assert_eq!(user_body["age_verification_status"], "pending");
}

#[tokio::test]
async fn test_get_verification_by_session() {
    let server = create_test_server();
    let user_id = create_full_user(&server).await;
    let session_id = start_verification(&server, &user_id).await;

    let response = server
        .get(&format!("/api/v1/verifications/{}", session_id))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["session_id"], session_id.as_str());
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_get_verification_not_found() {
    let server = create_test_server();

    let response = server.get("/api/v1/verifications/nonexistent_session").await;

    response.assert_status_not_found();
}

// ============ Webhook Endpoint Tests ============

#[tokio::test]
async fn test_webhook_requires_auth() {
    let server = create_test_server();

    let response = server
        .post("/webhooks/verification")
        .json(&approved_webhook("some_session"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_webhook_rejects_wrong_password() {
    let server = create_test_server();

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, basic_auth("hook", "wrong"))
        .json(&approved_webhook("some_session"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_non_post_is_method_not_allowed() {
    let server = create_test_server();

    // Method is checked before credentials
    let response = server.get("/webhooks/verification").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_webhook_unknown_session() {
    let server = create_test_server();

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook("never_started_session"))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_webhook_rejects_unknown_fields() {
    let server = create_test_server();

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&json!({
            "EventType": "KycIdentification.Approved",
            "Payload": {
                "Id": "ident-1",
                "ExternalReferenceId": "s1",
                "Status": "Approved"
            },
            "Unexpected": true
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_webhook_rejects_empty_session_id() {
    let server = create_test_server();

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook(""))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing session ID");
}

// ============ End-to-End Flow Tests ============

/// Test complete flow: Create User -> Start Verification -> Approved Webhook
#[tokio::test]
async fn test_e2e_approved_verification_flow() {
    let server = create_test_server();

    // Step 1: Create a fully filled-out anonymous user
    let user_id = create_full_user(&server).await;

    // Step 2: Start a verification attempt
    let session_id = start_verification(&server, &user_id).await;

    // Step 3: Provider reports approval
    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook(&session_id))
        .await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["message"], "Webhook processed successfully");
    assert_eq!(ack["status"], "completed");

    // Step 4: The attempt is finalized with provider metadata
    let response = server
        .get(&format!("/api/v1/verifications/{}", session_id))
        .await;
    response.assert_status_ok();
    let attempt: serde_json::Value = response.json();
    assert_eq!(attempt["status"], "completed");
    assert_eq!(attempt["provider_status"], "Approved");

    // Step 5: Profile is verified, complete, and promoted
    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
    response.assert_status_ok();
    let user: serde_json::Value = response.json();
    assert_eq!(user["age_verification_status"], "verified");
    assert_eq!(user["profile_completion"], 100);
    assert_eq!(user["onboarding_complete"], true);
    assert_eq!(user["account_type"], "family");
    assert_eq!(user["verification_method"], "ondato");
    assert!(user["age_verification_date"].as_str().is_some());

    // Step 6: Exactly one notification was recorded
    let response = server
        .get(&format!("/api/v1/users/{}/notifications", user_id))
        .await;
    response.assert_status_ok();
    let feed: serde_json::Value = response.json();
    let items = feed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Verification Approved");
    assert_eq!(items[0]["kind"], "verification_update");
    assert_eq!(items[0]["read"], false);

    // Step 7: Stats reflect the finalized attempt
    let response = server.get("/api/v1/stats").await;
    response.assert_status_ok();
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["total_attempts"], 1);
    assert_eq!(stats["completed_attempts"], 1);
    assert_eq!(stats["total_notifications"], 1);
}

/// Test complete flow: rejection records reasons and does not promote
#[tokio::test]
async fn test_e2e_rejected_verification_flow() {
    let server = create_test_server();

    let user_id = create_full_user(&server).await;
    let session_id = start_verification(&server, &user_id).await;

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&rejected_webhook(&session_id, &["Document not clear"]))
        .await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["status"], "failed");

    let response = server
        .get(&format!("/api/v1/verifications/{}", session_id))
        .await;
    response.assert_status_ok();
    let attempt: serde_json::Value = response.json();
    assert_eq!(attempt["status"], "failed");
    assert_eq!(attempt["rejection_reasons"][0], "Document not clear");

    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
    response.assert_status_ok();
    let user: serde_json::Value = response.json();
    assert_eq!(user["age_verification_status"], "rejected");
    // Rejection never promotes the account
    assert_eq!(user["account_type"], "anonymous");
    assert!(user["age_verification_date"].is_null());

    let response = server
        .get(&format!("/api/v1/users/{}/notifications", user_id))
        .await;
    response.assert_status_ok();
    let feed: serde_json::Value = response.json();
    let items = feed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Verification Failed");
    assert!(items[0]["message"]
        .as_str()
        .unwrap()
        .contains("Document not clear"));
}

/// Duplicate deliveries acknowledge without reapplying side effects
#[tokio::test]
async fn test_e2e_duplicate_webhook_is_idempotent() {
    let server = create_test_server();

    let user_id = create_full_user(&server).await;
    let session_id = start_verification(&server, &user_id).await;

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook(&session_id))
        .await;
    response.assert_status_ok();

    // Same event delivered again
    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook(&session_id))
        .await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["message"], "Webhook already processed");
    assert_eq!(ack["status"], "completed");

    let response = server
        .get(&format!("/api/v1/users/{}/notifications", user_id))
        .await;
    response.assert_status_ok();
    let feed: serde_json::Value = response.json();
    assert_eq!(feed.as_array().unwrap().len(), 1);
}

/// In-flight provider statuses acknowledge without finalizing
#[tokio::test]
async fn test_e2e_pending_status_keeps_attempt_open() {
    let server = create_test_server();

    let user_id = create_full_user(&server).await;
    let session_id = start_verification(&server, &user_id).await;

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&json!({
            "EventType": "KycIdentification.Created",
            "Payload": {
                "Id": "ident-1",
                "ExternalReferenceId": session_id,
                "Status": "Pending",
                "VerificationData": null,
                "RejectionReasons": null
            }
        }))
        .await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["message"], "Webhook acknowledged");
    assert_eq!(ack["status"], "pending");

    let response = server
        .get(&format!("/api/v1/verifications/{}", session_id))
        .await;
    response.assert_status_ok();
    let attempt: serde_json::Value = response.json();
    assert_eq!(attempt["status"], "pending");

    let response = server
        .get(&format!("/api/v1/users/{}/notifications", user_id))
        .await;
    response.assert_status_ok();
    let feed: serde_json::Value = response.json();
    assert_eq!(feed.as_array().unwrap().len(), 0);
}

/// Approval verifies the profile but promotion requires a complete one
#[tokio::test]
async fn test_e2e_incomplete_profile_not_promoted() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "username": "casey" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let user_id = body["user_id"].as_str().unwrap().to_string();

    let session_id = start_verification(&server, &user_id).await;

    let response = server
        .post("/webhooks/verification")
        .add_header(AUTHORIZATION, webhook_auth())
        .json(&approved_webhook(&session_id))
        .await;
    response.assert_status_ok();

    let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
    response.assert_status_ok();
    let user: serde_json::Value = response.json();
    assert_eq!(user["age_verification_status"], "verified");
    // username + determined status = 2 of 7 tracked fields
    assert_eq!(user["profile_completion"], 29);
    assert_eq!(user["onboarding_complete"], false);
    assert_eq!(user["account_type"], "anonymous");
}
