//! Demo authentication API.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, DEMO_TOKEN};

/// Login response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub token: &'static str,
}

/// Sign in as the demo user.
pub async fn login(session: Session) -> Result<Json<LoginResponse>> {
    let user = CurrentUser::demo();

    set_current_user(&session, &user).await.map_err(|e| {
        tracing::error!("Failed to set session: {}", e);
        AppError::Internal("session store unavailable".to_string())
    })?;
    set_sentry_user(&user.id);

    Ok(Json(LoginResponse {
        user_id: user.id,
        token: DEMO_TOKEN,
    }))
}

/// Clear the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await.map_err(|e| {
        tracing::error!("Failed to clear session: {}", e);
        AppError::Internal("session store unavailable".to_string())
    })?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}
