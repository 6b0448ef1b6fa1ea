//! Buyer lead operations.
//!
//! Every operation validates its input with [`leadbook_core::validation`] before
//! touching the store, so handlers, pages, and the CLI share one rule set.

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use leadbook_core::import::prepare_import;
use leadbook_core::rate_limit::RateDecision;
use leadbook_core::validation::validate_buyer;
use leadbook_core::{Buyer, BuyerHistory, BuyerId, BuyerStatus};

use crate::db::{BuyerPage, BuyerQuery, BuyerStore, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::rate_limit::RateLimiter;

/// Raw list query string.
///
/// Every field is read as text so a malformed number falls back to its default
/// instead of rejecting the request.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    /// Normalize into a store query.
    ///
    /// `page` defaults to 1 and `pageSize` to 10 (clamped to 1..=100). Blank
    /// `search` and `status` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown status.
    pub fn to_query(&self) -> Result<BuyerQuery> {
        let page = parse_number(self.page.as_deref())
            .filter(|page| *page >= 1)
            .unwrap_or(1);

        let page_size = parse_number(self.page_size.as_deref())
            .map_or(BuyerQuery::DEFAULT_PAGE_SIZE, |size| {
                size.clamp(1, BuyerQuery::MAX_PAGE_SIZE)
            });

        let search = non_blank(self.search.as_deref()).map(str::to_owned);

        let status = non_blank(self.status.as_deref())
            .map(str::parse::<BuyerStatus>)
            .transpose()
            .map_err(|err| AppError::BadRequest(format!("Invalid status '{}'", err.value)))?;

        Ok(BuyerQuery {
            page,
            page_size,
            search,
            status,
        })
    }
}

fn parse_number(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a path segment as a buyer ID.
///
/// A segment that is not a UUID cannot name a buyer, so it reads as not found.
///
/// # Errors
///
/// Returns `AppError::NotFound` when the segment is not a UUID.
pub fn parse_buyer_id(raw: &str) -> Result<BuyerId> {
    raw.parse().map_err(|_| AppError::buyer_not_found())
}

/// Count one create attempt for `client`.
///
/// # Errors
///
/// Returns `AppError::RateLimited` once the client has used its window, or
/// `AppError::Database` if the counter store fails.
pub async fn enforce_rate_limit(limiter: &RateLimiter, client: &str) -> Result<()> {
    match limiter.check(client).await? {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Limited { retry_after_secs } => {
            Err(AppError::RateLimited { retry_after_secs })
        }
    }
}

/// Buyer operations over a [`BuyerStore`].
pub struct BuyerService<'a> {
    store: &'a dyn BuyerStore,
}

impl<'a> BuyerService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn BuyerStore) -> Self {
        Self { store }
    }

    /// Validate and store a new lead.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the payload fails validation.
    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: &Value, owner_id: &str) -> Result<Buyer> {
        let draft = validate_buyer(payload)?;
        let buyer = self.store.create(draft, owner_id).await?;
        tracing::info!(buyer_id = %buyer.id, "Buyer created");
        Ok(buyer)
    }

    /// One page of summaries.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown status filter.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<BuyerPage> {
        let query = params.to_query()?;
        Ok(self.store.list(&query).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the buyer does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: BuyerId) -> Result<Buyer> {
        self.store
            .get(id)
            .await?
            .ok_or_else(AppError::buyer_not_found)
    }

    /// Update a lead's fields and record the diff.
    ///
    /// Optional keys left out of the payload keep their stored values; `null` or
    /// `""` clears them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the payload fails validation or the
    /// merged budgets are out of order, or `AppError::NotFound` if the buyer does
    /// not exist.
    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: BuyerId, payload: &Value, changed_by: &str) -> Result<Buyer> {
        let draft = validate_buyer(payload)?;
        let buyer = self
            .store
            .update(id, draft, changed_by)
            .await
            .map_err(|err| match err {
                RepositoryError::Invalid(errors) => AppError::Validation(errors),
                other => other.into(),
            })?;
        tracing::info!(buyer_id = %buyer.id, "Buyer updated");
        Ok(buyer)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the buyer does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: BuyerId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(buyer_id = %id, "Buyer deleted");
        Ok(())
    }

    /// Audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the buyer does not exist.
    #[instrument(skip(self))]
    pub async fn history(&self, id: BuyerId) -> Result<Vec<BuyerHistory>> {
        if self.store.get(id).await?.is_none() {
            return Err(AppError::buyer_not_found());
        }
        Ok(self.store.history(id).await?)
    }

    /// Import CSV text, all rows or none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Import` when the text is not CSV, has too many rows, or
    /// any row fails validation. Nothing is written in those cases.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn import_csv(&self, text: &str, owner_id: &str) -> Result<usize> {
        let drafts = prepare_import(text)?;
        let created = self.store.create_many(drafts, owner_id).await?;

        add_breadcrumb(
            "buyers",
            "Imported CSV",
            Some(&[("rows", created.to_string().as_str())]),
        );
        tracing::info!(created, "Buyers imported");
        Ok(created)
    }
}
