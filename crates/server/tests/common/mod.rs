//! Shared helpers for router tests.
//!
//! Builds the full application over [`MemoryBuyerStore`] and an in-memory
//! session store, so no database is needed.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use leadbook_server::config::{RateLimitConfig, ServerConfig};
use leadbook_server::db::MemoryBuyerStore;
use leadbook_server::middleware::session_layer;
use leadbook_server::services::RateLimiter;
use leadbook_server::state::AppState;

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn location(&self) -> &str {
        self.headers[header::LOCATION].to_str().unwrap()
    }

    /// `name=value` from the session `Set-Cookie` header.
    pub fn session_cookie(&self) -> String {
        let raw = self.headers[header::SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }
}

pub fn test_config(max_requests: u32) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        rate_limit: RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        },
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application with the given create limit per minute.
pub fn test_app_with_limit(max_requests: u32) -> Router {
    let config = test_config(max_requests);
    let limiter = RateLimiter::in_memory(max_requests, Duration::seconds(60));
    let state = AppState::new(config, Arc::new(MemoryBuyerStore::new()), limiter);
    leadbook_server::app(state, session_layer(MemoryStore::default(), false))
}

pub fn test_app() -> Router {
    test_app_with_limit(100)
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "203.0.113.20");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Sign in through the login page and return the session cookie.
pub async fn login(app: &Router) -> String {
    let reply = send(app, form_request("/login", "", None)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    reply.session_cookie()
}

/// A payload that passes validation.
pub fn valid_buyer(name: &str, phone: &str) -> Value {
    json!({
        "fullName": name,
        "email": "lead@example.com",
        "phone": phone,
        "city": "Mohali",
        "propertyType": "Apartment",
        "bhk": "Two",
        "purpose": "Buy",
        "budgetMin": 4_000_000,
        "budgetMax": 6_000_000,
        "timeline": "ThreeMonths",
        "source": "Website",
        "tags": ["hot"],
    })
}

/// Create a buyer through the API and return its JSON.
pub async fn create_buyer(app: &Router, name: &str, phone: &str) -> Value {
    let reply = send(
        app,
        json_request(Method::POST, "/api/buyers", &valid_buyer(name, phone)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
    reply.json()
}

pub const CSV_HEADER: &str =
    "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";

/// A CSV row that passes validation.
pub fn csv_row(index: usize) -> String {
    format!(
        "Lead {index},lead{index}@example.com,98{index:08},Chandigarh,Plot,,Buy,100000,200000,Exploring,Referral,,\"a, b\",New"
    )
}

pub fn csv_request(body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/buyers/import")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body))
        .unwrap()
}
