//! Per-client create rate limiting.
//!
//! [`RateLimiter`] applies the fixed-window rule from
//! [`leadbook_core::rate_limit`] through a pluggable [`CounterStore`]:
//!
//! - [`MemoryCounterStore`] keeps windows in process memory (single instance)
//! - [`crate::db::PgCounterStore`] keeps them in `PostgreSQL` (shared by instances)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use leadbook_core::rate_limit::{RateDecision, WindowState, admit};

use crate::db::RepositoryError;

/// Memory stores sweep expired windows once they hold this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

/// Storage for per-key windows. Each call applies one request atomically.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, RepositoryError>;
}

/// Windows held in a mutex-guarded map.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, RepositoryError> {
        // Each insert is a single write, so a poisoned map is still consistent.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, state| !state.is_expired(now));
        }

        let (next, decision) = admit(windows.get(key), limit, window, now);
        windows.insert(key.to_owned(), next);
        Ok(decision)
    }
}

/// Fixed-window limiter for buyer creation.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, limit: u32, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// Limiter with the in-memory store.
    #[must_use]
    pub fn in_memory(limit: u32, window: Duration) -> Self {
        Self::new(Arc::new(MemoryCounterStore::new()), limit, window)
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the counter store fails.
    pub async fn check(&self, key: &str) -> Result<RateDecision, RepositoryError> {
        let decision = self
            .store
            .hit(key, self.limit, self.window, Utc::now())
            .await?;

        if let RateDecision::Limited { retry_after_secs } = decision {
            tracing::warn!(client = %key, retry_after_secs, "Create rate limit exceeded");
        }

        Ok(decision)
    }
}
