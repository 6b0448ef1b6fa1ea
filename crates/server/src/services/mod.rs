//! Business logic services.
//!
//! - `buyers` - Validate, store, list, and import buyer leads
//! - `rate_limit` - Per-client create limits over a pluggable counter store

pub mod buyers;
pub mod rate_limit;

pub use buyers::{BuyerService, ListParams, enforce_rate_limit, parse_buyer_id};
pub use rate_limit::{CounterStore, MemoryCounterStore, RateLimiter};
