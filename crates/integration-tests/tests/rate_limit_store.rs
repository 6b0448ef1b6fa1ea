//! Shared counter store against a real database.
//!
//! These tests require a migrated `PostgreSQL` database reachable through
//! `LEADBOOK_DATABASE_URL` (or `DATABASE_URL`).
//!
//! Run with: `cargo test -p leadbook-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use leadbook_core::rate_limit::RateDecision;
use leadbook_server::config::database_url;
use leadbook_server::db::{PgCounterStore, create_pool};
use leadbook_server::services::CounterStore;

async fn store() -> PgCounterStore {
    let pool = create_pool(&database_url().unwrap()).await.unwrap();
    PgCounterStore::new(pool)
}

fn unique_key() -> String {
    format!("test:{}", uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_window_denies_then_resets() {
    let store = store().await;
    let key = unique_key();
    let window = Duration::seconds(2);
    let now = Utc::now();

    let first = store.hit(&key, 1, window, now).await.unwrap();
    assert_eq!(first, RateDecision::Allowed { remaining: 0 });

    let second = store.hit(&key, 1, window, now).await.unwrap();
    assert!(matches!(second, RateDecision::Limited { retry_after_secs } if retry_after_secs >= 1));

    let later = store
        .hit(&key, 1, window, now + Duration::seconds(3))
        .await
        .unwrap();
    assert_eq!(later, RateDecision::Allowed { remaining: 0 });
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_denied_hits_do_not_overflow_at_large_limits() {
    let store = store().await;
    let key = unique_key();
    let now = Utc::now();

    for _ in 0..3 {
        let decision = store
            .hit(&key, u32::MAX, Duration::seconds(60), now)
            .await
            .unwrap();
        assert!(matches!(decision, RateDecision::Allowed { .. }));
    }
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_prune_removes_expired_windows() {
    let store = store().await;
    let key = unique_key();
    let now = Utc::now();

    store.hit(&key, 5, Duration::seconds(1), now).await.unwrap();
    let pruned = store
        .prune_expired(now + Duration::seconds(5))
        .await
        .unwrap();
    assert!(pruned >= 1);

    // The key starts a fresh window after pruning.
    let decision = store
        .hit(&key, 5, Duration::seconds(1), now + Duration::seconds(5))
        .await
        .unwrap();
    assert_eq!(decision, RateDecision::Allowed { remaining: 4 });
}
