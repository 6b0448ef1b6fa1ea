//! Buyer JSON API.
//!
//! ```text
//! GET    /api/buyers              - Paginated list (?page&pageSize&search&status)
//! POST   /api/buyers              - Create (rate-limited per client)
//! POST   /api/buyers/new          - Same as POST /api/buyers
//! POST   /api/buyers/import       - CSV import, all rows or none
//! GET    /api/buyers/{id}         - Fetch one
//! PUT    /api/buyers/{id}         - Update fields, record diff
//! DELETE /api/buyers/{id}         - Delete with history
//! GET    /api/buyers/{id}/history - Audit entries, newest first
//! ```
//!
//! Writes are attributed to the session user, or the demo user without one.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use leadbook_core::{Buyer, BuyerHistory};

use super::parse_json;
use crate::db::BuyerPage;
use crate::error::Result;
use crate::middleware::{ClientKey, OptionalAuth};
use crate::services::{BuyerService, ListParams, enforce_rate_limit, parse_buyer_id};
use crate::state::AppState;

/// Import response body.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: usize,
}

/// Delete response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// List buyers.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BuyerPage>> {
    let page = BuyerService::new(state.buyers()).list(&params).await?;
    Ok(Json(page))
}

/// Create a buyer.
///
/// The rate limit is counted before the body is parsed, so rejected payloads
/// still use up the client's window.
#[instrument(skip(state, auth, body))]
pub async fn create(
    State(state): State<AppState>,
    auth: OptionalAuth,
    ClientKey(client): ClientKey,
    body: Bytes,
) -> Result<(StatusCode, Json<Buyer>)> {
    enforce_rate_limit(state.limiter(), &client).await?;

    let payload: Value = parse_json(&body)?;
    let buyer = BuyerService::new(state.buyers())
        .create(&payload, &auth.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(buyer)))
}

/// Fetch one buyer.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Buyer>> {
    let id = parse_buyer_id(&id)?;
    let buyer = BuyerService::new(state.buyers()).get(id).await?;
    Ok(Json(buyer))
}

/// Replace a buyer's fields.
#[instrument(skip(state, auth, body))]
pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Buyer>> {
    let id = parse_buyer_id(&id)?;
    let payload: Value = parse_json(&body)?;
    let buyer = BuyerService::new(state.buyers())
        .update(id, &payload, &auth.user_id())
        .await?;
    Ok(Json(buyer))
}

/// Delete a buyer and its history.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_buyer_id(&id)?;
    BuyerService::new(state.buyers()).delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Buyer deleted",
    }))
}

/// History for one buyer.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BuyerHistory>>> {
    let id = parse_buyer_id(&id)?;
    let entries = BuyerService::new(state.buyers()).history(id).await?;
    Ok(Json(entries))
}

/// Import buyers from a CSV body.
#[instrument(skip(state, auth, body))]
pub async fn import(
    State(state): State<AppState>,
    auth: OptionalAuth,
    body: String,
) -> Result<(StatusCode, Json<ImportResponse>)> {
    let created = BuyerService::new(state.buyers())
        .import_csv(&body, &auth.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(ImportResponse { created })))
}
