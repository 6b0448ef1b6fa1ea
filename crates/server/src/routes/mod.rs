//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (store ping)
//! GET  /                         - Redirect to /buyers
//!
//! # Auth
//! GET  /login                    - Demo login page
//! POST /login                    - Sign in as the demo user
//! POST /logout                   - Sign out
//!
//! # Pages (require a session)
//! GET  /buyers                   - List with search, status filter, pagination
//! GET  /buyers/new               - Intake form
//! POST /buyers/new               - Create (rate-limited)
//! GET  /buyers/import            - CSV paste form
//! POST /buyers/import            - Import
//! GET  /buyers/{id}              - Edit form with history
//! POST /buyers/{id}              - Update
//! POST /buyers/{id}/delete       - Delete
//!
//! # JSON API
//! POST /api/auth/login           - Demo login
//! POST /api/auth/logout          - Logout
//! /api/buyers/...                - See `api::buyers`
//! ```

pub mod api;
pub mod auth;
pub mod buyers;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route(
            "/buyers",
            get(api::buyers::list).post(api::buyers::create),
        )
        .route("/buyers/new", post(api::buyers::create))
        .route("/buyers/import", post(api::buyers::import))
        .route(
            "/buyers/{id}",
            get(api::buyers::show)
                .put(api::buyers::update)
                .delete(api::buyers::delete),
        )
        .route("/buyers/{id}/history", get(api::buyers::history))
}

/// Create the buyer page routes router.
pub fn buyer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(buyers::index))
        .route("/new", get(buyers::new_page).post(buyers::create))
        .route("/import", get(buyers::import_page).post(buyers::import))
        .route("/{id}", get(buyers::edit_page).post(buyers::update))
        .route("/{id}/delete", post(buyers::delete))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(|| async { Redirect::to("/buyers") }))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/buyers", buyer_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the buyer store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.buyers().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
