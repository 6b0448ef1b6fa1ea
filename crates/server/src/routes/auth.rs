//! Demo login pages.
//!
//! There are no credentials: submitting the login form signs the browser in as
//! the demo user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user_id: Option<String>,
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(auth: OptionalAuth, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    let error = query.error.map(|code| match code.as_str() {
        "session" => "Could not start a session. Please try again.".to_string(),
        _ => "Login failed.".to_string(),
    });

    LoginTemplate {
        user_id: auth.0.map(|user| user.id),
        error,
    }
}

/// Sign in as the demo user.
pub async fn login(session: Session) -> Response {
    let user = CurrentUser::demo();

    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }

    set_sentry_user(&user.id);
    tracing::info!(user_id = %user.id, "Demo login");
    Redirect::to("/buyers").into_response()
}

/// Sign out and return to the login page.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/login").into_response()
}
