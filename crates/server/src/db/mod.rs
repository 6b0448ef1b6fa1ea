//! Database operations for Leadbook `PostgreSQL`.
//!
//! ## Tables
//!
//! - `buyers` - Buyer leads
//! - `buyer_history` - Append-only audit entries, one per create/update
//! - `rate_limit_windows` - Shared fixed-window counters (optional backend)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p leadbook-cli -- migrate
//! ```

pub mod buyers;
pub mod memory;
pub mod rate_limits;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use leadbook_core::validation::ValidationErrors;
use leadbook_core::{Buyer, BuyerDraft, BuyerHistory, BuyerId, BuyerStatus, BuyerSummary};

pub use buyers::PgBuyerStore;
pub use memory::MemoryBuyerStore;
pub use rate_limits::PgCounterStore;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// An update would break a buyer invariant once merged with stored values.
    #[error("invalid update: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Filter and page selection for listing buyers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Case-insensitive substring matched against name, email, and phone.
    pub search: Option<String>,
    pub status: Option<BuyerStatus>,
}

impl BuyerQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Rows to skip for the selected page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for BuyerQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
        }
    }
}

/// One page of buyer summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerPage {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub buyers: Vec<BuyerSummary>,
}

impl BuyerPage {
    #[must_use]
    pub fn new(query: &BuyerQuery, total_count: u64, buyers: Vec<BuyerSummary>) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
            total_count,
            total_pages: total_count.div_ceil(u64::from(query.page_size.max(1))),
            buyers,
        }
    }
}

/// Persistence for buyers and their history.
///
/// Every write that touches more than one row runs in a single transaction:
/// create (buyer + history), update (buyer + history), delete (history + buyer),
/// and bulk create.
#[async_trait]
pub trait BuyerStore: Send + Sync {
    /// Insert a buyer and its `{"created": true}` history entry.
    async fn create(&self, draft: BuyerDraft, owner_id: &str) -> Result<Buyer, RepositoryError>;

    /// Insert every draft, each with its history entry, all or nothing.
    async fn create_many(
        &self,
        drafts: Vec<BuyerDraft>,
        owner_id: &str,
    ) -> Result<usize, RepositoryError>;

    async fn get(&self, id: BuyerId) -> Result<Option<Buyer>, RepositoryError>;

    /// Page of summaries ordered by `updated_at` descending.
    async fn list(&self, query: &BuyerQuery) -> Result<BuyerPage, RepositoryError>;

    /// Apply the draft to a buyer and record the field diff.
    ///
    /// Optional fields the draft omitted keep their stored values. Returns
    /// `RepositoryError::NotFound` when the buyer does not exist, or
    /// `RepositoryError::Invalid` when the merged budgets are out of order.
    async fn update(
        &self,
        id: BuyerId,
        draft: BuyerDraft,
        changed_by: &str,
    ) -> Result<Buyer, RepositoryError>;

    /// Delete a buyer and all of its history.
    ///
    /// Returns `RepositoryError::NotFound` when the buyer does not exist.
    async fn delete(&self, id: BuyerId) -> Result<(), RepositoryError>;

    /// History entries for a buyer, newest first.
    async fn history(&self, id: BuyerId) -> Result<Vec<BuyerHistory>, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
