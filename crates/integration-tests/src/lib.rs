//! Integration tests for Leadbook.
//!
//! These run over HTTP against a server that is already up with a migrated
//! database, so every test is `#[ignore]`d by default.
//!
//! ```bash
//! lb-cli migrate
//! cargo run -p leadbook-server &
//! LEADBOOK_BASE_URL=http://localhost:3000 cargo test -p leadbook-integration-tests -- --ignored
//! ```

use std::fmt::Write;

use leadbook_core::import::MAX_IMPORT_ROWS;
use reqwest::Client;
use serde_json::{Value, json};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("LEADBOOK_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client with a cookie jar, so a login carries over to later requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A phone number unlikely to collide with earlier runs.
#[must_use]
pub fn unique_phone() -> String {
    let digits: String = uuid::Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(10)
        .collect();
    format!("{digits:0<10}")
}

/// A lead payload that passes validation.
#[must_use]
pub fn valid_buyer(name: &str) -> Value {
    json!({
        "fullName": name,
        "phone": unique_phone(),
        "city": "Chandigarh",
        "propertyType": "Villa",
        "bhk": "Three",
        "purpose": "Buy",
        "budgetMin": 9_000_000,
        "budgetMax": 12_000_000,
        "timeline": "SixMonths",
        "source": "Referral",
        "tags": ["integration"],
    })
}

/// Import CSV with `rows` valid data rows, capped at the import limit.
#[must_use]
pub fn import_csv(rows: usize) -> String {
    let mut csv = String::from("fullName,phone,city,propertyType,bhk,purpose,timeline,source\n");
    for i in 0..rows.min(MAX_IMPORT_ROWS) {
        let _ = writeln!(
            csv,
            "Integration Lead {i},{},Panchkula,Plot,,Rent,Exploring,Call",
            unique_phone()
        );
    }
    csv
}
