//! Integration tests for the buyer API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`lb-cli migrate`)
//! - The server running (`cargo run -p leadbook-server`)
//!
//! Run with: `cargo test -p leadbook-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use leadbook_integration_tests::{base_url, client, import_csv, valid_buyer};
use reqwest::StatusCode;
use serde_json::Value;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_health_and_readiness() {
    let client = client();
    let base_url = base_url();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Buyer lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_create_update_history_delete() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/api/buyers"))
        .json(&valid_buyer("Integration Create"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let buyer: Value = resp.json().await.unwrap();
    let id = buyer["id"].as_str().unwrap().to_string();
    assert_eq!(buyer["status"], "New");

    let mut payload = valid_buyer("Integration Create");
    payload["status"] = "Qualified".into();
    let resp = client
        .put(format!("{base_url}/api/buyers/{id}"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let history: Value = client
        .get(format!("{base_url}/api/buyers/{id}/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["diff"]["updated"]["status"]["to"], "Qualified");

    let resp = client
        .delete(format!("{base_url}/api/buyers/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/buyers/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_invalid_buyer_is_rejected() {
    let client = client();
    let base_url = base_url();

    let mut payload = valid_buyer("Integration Invalid");
    payload["budgetMin"] = 20_000_000.into();

    let resp = client
        .post(format!("{base_url}/api/buyers"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_list_filters_by_status() {
    let client = client();
    let base_url = base_url();

    let page: Value = client
        .get(format!("{base_url}/api/buyers?status=New&pageSize=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page["pageSize"], 5);
    for buyer in page["buyers"].as_array().unwrap() {
        assert_eq!(buyer["status"], "New");
    }
}

// ============================================================================
// Import
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_import_creates_rows() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/api/buyers/import"))
        .header("content-type", "text/csv")
        .body(import_csv(3))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["created"], 3);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_import_rejects_bad_rows() {
    let client = client();
    let base_url = base_url();

    let mut csv = import_csv(1);
    csv.push_str("Broken,123,Nowhere,Plot,,Rent,Exploring,Call\n");

    let resp = client
        .post(format!("{base_url}/api/buyers/import"))
        .header("content-type", "text/csv")
        .body(csv)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_demo_login() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["userId"], "demo-user");

    // The session cookie from the API login also opens the pages.
    let resp = client.get(format!("{base_url}/buyers")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
