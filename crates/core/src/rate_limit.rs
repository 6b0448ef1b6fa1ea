//! Fixed-window admission rule.
//!
//! Each client key owns one window: a counter and the instant the window ends.
//! The first request for a key, or the first after its window has ended, opens a
//! fresh window with a count of 1. Later requests in the same window are admitted
//! until the count reaches the limit.
//!
//! Windows reset lazily on the next request, so a burst straddling a boundary is
//! admitted in full on both sides.
//!
//! This module is the pure rule. Where window state lives (process memory or
//! `PostgreSQL`) is the server's concern.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Counter state for one client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub count: u32,
    pub resets_at: DateTime<Utc>,
}

impl WindowState {
    /// Whether this window has ended as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.resets_at < now
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Apply one request to a key's window.
///
/// Returns the window state to store and the decision. A denied request leaves
/// the stored state unchanged.
#[must_use]
pub fn admit(
    current: Option<&WindowState>,
    limit: u32,
    window: Duration,
    now: DateTime<Utc>,
) -> (WindowState, RateDecision) {
    match current {
        Some(state) if !state.is_expired(now) => {
            if state.count >= limit {
                let decision = RateDecision::Limited {
                    retry_after_secs: retry_after_secs(state.resets_at, now),
                };
                (*state, decision)
            } else {
                let next = WindowState {
                    count: state.count + 1,
                    resets_at: state.resets_at,
                };
                let decision = RateDecision::Allowed {
                    remaining: limit - next.count,
                };
                (next, decision)
            }
        }
        _ => {
            let fresh = WindowState {
                count: 1,
                resets_at: now + window,
            };
            let decision = RateDecision::Allowed {
                remaining: limit.saturating_sub(1),
            };
            (fresh, decision)
        }
    }
}

/// Whole seconds until `resets_at`, rounded up.
#[must_use]
pub fn retry_after_secs(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (resets_at - now).num_milliseconds().max(0);
    u64::try_from(millis).map_or(0, |ms| ms.div_ceil(1000))
}
