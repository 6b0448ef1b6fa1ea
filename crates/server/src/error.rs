//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to Sentry
//! before responding to the client. JSON handlers return `Result<T, AppError>`;
//! page handlers wrap it in [`PageError`] to render an HTML error page instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use leadbook_core::import::ImportError;
use leadbook_core::validation::ValidationErrors;

use crate::db::RepositoryError;
use crate::filters;

/// Message returned for a missing buyer.
pub const BUYER_NOT_FOUND: &str = "Buyer not found";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payload failed the buyer schema.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// CSV import was refused.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The buyer-not-found error.
    #[must_use]
    pub fn buyer_not_found() -> Self {
        Self::NotFound(BUYER_NOT_FOUND.to_string())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Import(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Whether this error is a server fault worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ) | Self::Internal(_)
        )
    }

    /// Message safe to show to a client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => BUYER_NOT_FOUND.to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal Server Error".to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            Self::Import(err) => err.to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited { .. } => "Too many requests".to_string(),
        }
    }

    /// Log and report server errors.
    fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Import(ImportError::InvalidRows(rows)) => json!({ "errors": rows }),
            Self::RateLimited { retry_after_secs } => json!({
                "error": self.public_message(),
                "retryAfter": retry_after_secs,
            }),
            _ => json!({ "error": self.public_message() }),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: String,
    pub message: String,
}

/// `AppError` rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for PageError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.report();

        let status = err.status();
        let page = ErrorTemplate {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message: err.public_message(),
        };
        (status, page).into_response()
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("buyers", "Imported CSV", Some(&[("rows", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use leadbook_core::import::{CsvError, RowError};
    use leadbook_core::validation::IssueCode;

    use super::*;

    async fn into_parts(err: AppError) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("buyer-123".to_string());
        assert_eq!(err.to_string(), "Not found: buyer-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::buyer_not_found()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited {
                retry_after_secs: 3
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_issues() {
        let err = AppError::Validation(ValidationErrors::single(
            "phone",
            IssueCode::InvalidString,
            "phone must be 10-15 digits",
        ));
        let (status, _, body) = into_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "phone");
        assert_eq!(body["errors"][0]["code"], "invalid_string");
        assert_eq!(body["errors"][0]["message"], "phone must be 10-15 digits");
    }

    #[tokio::test]
    async fn test_import_row_errors_body() {
        let err = AppError::Import(ImportError::InvalidRows(vec![RowError {
            row: 2,
            issues: Vec::new(),
        }]));
        let (status, _, body) = into_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "errors": [{ "row": 2, "issues": [] }] }));
    }

    #[tokio::test]
    async fn test_import_refusals_use_error_message() {
        let err = AppError::Import(ImportError::TooManyRows {
            max: 200,
            found: 201,
        });
        let (_, _, body) = into_parts(err).await;
        assert_eq!(body, json!({ "error": "Max 200 rows allowed" }));

        let err = AppError::Import(ImportError::Csv(CsvError {
            line: Some(3),
            message: "malformed CSV: bad quote".to_string(),
        }));
        let (status, _, body) = into_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "malformed CSV: bad quote");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let (status, retry_after, body) = into_parts(AppError::RateLimited {
            retry_after_secs: 42,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("42"));
        assert_eq!(body, json!({ "error": "Too many requests", "retryAfter": 42 }));
    }

    #[tokio::test]
    async fn test_internal_errors_are_sanitized() {
        let (_, _, body) =
            into_parts(AppError::Internal("connection string leaked".to_string())).await;
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (_, _, body) = into_parts(AppError::buyer_not_found()).await;
        assert_eq!(body, json!({ "error": "Buyer not found" }));
    }
}
