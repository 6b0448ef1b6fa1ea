//! In-process buyer store.
//!
//! Same semantics as [`super::PgBuyerStore`] without a database. Used by the
//! router tests and for running the server against throwaway data.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use leadbook_core::{Buyer, BuyerDraft, BuyerHistory, BuyerId, HistoryId, diff_buyer};

use super::{BuyerPage, BuyerQuery, BuyerStore, RepositoryError};

#[derive(Default)]
struct Tables {
    /// Insertion order.
    buyers: Vec<Buyer>,
    /// Insertion order.
    history: Vec<BuyerHistory>,
}

impl Tables {
    fn insert(&mut self, draft: BuyerDraft, owner_id: &str) -> Buyer {
        let now = Utc::now();
        let buyer = Buyer::from_draft(BuyerId::generate(), draft, owner_id, now);
        self.history.push(BuyerHistory {
            id: HistoryId::generate(),
            buyer_id: buyer.id,
            changed_by: owner_id.to_owned(),
            changed_at: now,
            diff: BuyerHistory::created_diff(),
        });
        self.buyers.push(buyer.clone());
        buyer
    }
}

/// Buyer store held in memory.
#[derive(Default)]
pub struct MemoryBuyerStore {
    tables: Mutex<Tables>,
}

impl MemoryBuyerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn matches_query(buyer: &Buyer, query: &BuyerQuery) -> bool {
    if query.status.is_some_and(|status| buyer.status != status) {
        return false;
    }

    let Some(search) = &query.search else {
        return true;
    };
    let needle = search.to_lowercase();
    let email = buyer.email.as_ref().map(|e| e.as_str());

    [Some(buyer.full_name.as_str()), email, Some(buyer.phone.as_str())]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[async_trait]
impl BuyerStore for MemoryBuyerStore {
    async fn create(&self, draft: BuyerDraft, owner_id: &str) -> Result<Buyer, RepositoryError> {
        Ok(self.lock().insert(draft, owner_id))
    }

    async fn create_many(
        &self,
        drafts: Vec<BuyerDraft>,
        owner_id: &str,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.lock();
        let created = drafts.len();
        for draft in drafts {
            tables.insert(draft, owner_id);
        }
        Ok(created)
    }

    async fn get(&self, id: BuyerId) -> Result<Option<Buyer>, RepositoryError> {
        Ok(self.lock().buyers.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, query: &BuyerQuery) -> Result<BuyerPage, RepositoryError> {
        let tables = self.lock();

        // Newest insert first so equal timestamps still list newest first.
        let mut found: Vec<&Buyer> = tables
            .buyers
            .iter()
            .rev()
            .filter(|b| matches_query(b, query))
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = found.len() as u64;
        let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page_size = usize::try_from(query.page_size).unwrap_or(usize::MAX);
        let buyers = found
            .into_iter()
            .skip(skip)
            .take(page_size)
            .map(Buyer::summary)
            .collect();

        Ok(BuyerPage::new(query, total, buyers))
    }

    async fn update(
        &self,
        id: BuyerId,
        draft: BuyerDraft,
        changed_by: &str,
    ) -> Result<Buyer, RepositoryError> {
        let mut tables = self.lock();
        let buyer = tables
            .buyers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(RepositoryError::NotFound)?;

        let before = buyer.clone();
        buyer.apply(draft, Utc::now())?;
        let after = buyer.clone();

        tables.history.push(BuyerHistory {
            id: HistoryId::generate(),
            buyer_id: id,
            changed_by: changed_by.to_owned(),
            changed_at: after.updated_at,
            diff: diff_buyer(&before, &after),
        });

        Ok(after)
    }

    async fn delete(&self, id: BuyerId) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let before = tables.buyers.len();
        tables.buyers.retain(|b| b.id != id);
        if tables.buyers.len() == before {
            return Err(RepositoryError::NotFound);
        }
        tables.history.retain(|h| h.buyer_id != id);
        Ok(())
    }

    async fn history(&self, id: BuyerId) -> Result<Vec<BuyerHistory>, RepositoryError> {
        let tables = self.lock();
        let mut entries: Vec<BuyerHistory> = tables
            .history
            .iter()
            .rev()
            .filter(|h| h.buyer_id == id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
