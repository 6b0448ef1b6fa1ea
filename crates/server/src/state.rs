//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::BuyerStore;
use crate::services::rate_limit::RateLimiter;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the buyer store, the create rate limiter, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    buyers: Arc<dyn BuyerStore>,
    limiter: RateLimiter,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `buyers` - Buyer persistence
    /// * `limiter` - Create rate limiter
    #[must_use]
    pub fn new(config: ServerConfig, buyers: Arc<dyn BuyerStore>, limiter: RateLimiter) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                buyers,
                limiter,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the buyer store.
    #[must_use]
    pub fn buyers(&self) -> &dyn BuyerStore {
        self.inner.buyers.as_ref()
    }

    /// Get the create rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }
}
