//! Shared fixed-window counters in `PostgreSQL`.
//!
//! One row per client key. A single upsert opens, resets, or advances the window
//! atomically, so concurrent requests from several server instances see one count.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use leadbook_core::rate_limit::{RateDecision, retry_after_secs};

use super::RepositoryError;
use crate::services::rate_limit::CounterStore;

/// Expired windows are deleted once every this many hits.
const PRUNE_EVERY: u64 = 1_000;

/// Counter store backed by the `rate_limit_windows` table.
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
    hits: Arc<AtomicU64>,
}

impl PgCounterStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Delete every window that ended before `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM rate_limit_windows WHERE resets_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Highest count stored for a key: one past the limit, within `INTEGER`.
///
/// Denied requests stop advancing the count here.
pub(crate) fn count_cap(limit: u32) -> i32 {
    i32::try_from(limit.saturating_add(1)).unwrap_or(i32::MAX)
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, RepositoryError> {
        if self.hits.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            match self.prune_expired(now).await {
                Ok(pruned) => tracing::debug!(pruned, "Pruned expired rate-limit windows"),
                Err(e) => tracing::warn!(error = %e, "Failed to prune rate-limit windows"),
            }
        }

        let (count, resets_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO rate_limit_windows AS w (key, count, resets_at)
            VALUES ($1, 1, $3)
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN w.resets_at < $2 THEN 1
                    ELSE LEAST(w.count, $4 - 1) + 1
                END,
                resets_at = CASE
                    WHEN w.resets_at < $2 THEN $3
                    ELSE w.resets_at
                END
            RETURNING count, resets_at
            ",
        )
        .bind(key)
        .bind(now)
        .bind(now + window)
        .bind(count_cap(limit))
        .fetch_one(&self.pool)
        .await?;

        let count = u32::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))?;

        if count <= limit {
            Ok(RateDecision::Allowed {
                remaining: limit - count,
            })
        } else {
            Ok(RateDecision::Limited {
                retry_after_secs: retry_after_secs(resets_at, now),
            })
        }
    }
}
