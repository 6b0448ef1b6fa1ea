//! JSON API handlers.

pub mod auth;
pub mod buyers;

use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// Parse a JSON request body.
///
/// Bodies are read as bytes so that malformed JSON maps to the API's own
/// `{"error": ...}` shape rather than the framework's plain-text rejection.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::BadRequest("Invalid JSON body".to_string())
    })
}
