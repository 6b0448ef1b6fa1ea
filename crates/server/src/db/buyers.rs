//! `PostgreSQL` buyer repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use leadbook_core::{
    Buyer, BuyerDraft, BuyerHistory, BuyerId, BuyerSummary, HistoryId, diff_buyer,
};

use super::{BuyerPage, BuyerQuery, BuyerStore, RepositoryError};

const BUYER_COLUMNS: &str = "id, full_name, email, phone, city, property_type, bhk, purpose, \
     budget_min, budget_max, timeline, source, notes, tags, status, owner_id, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, full_name, email, phone, city, property_type, status, updated_at";

/// Buyer store backed by the `buyers` and `buyer_history` tables.
#[derive(Clone)]
pub struct PgBuyerStore {
    pool: PgPool,
}

impl PgBuyerStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuyerStore for PgBuyerStore {
    #[instrument(skip(self, draft))]
    async fn create(&self, draft: BuyerDraft, owner_id: &str) -> Result<Buyer, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let buyer = insert_with_history(&mut tx, draft, owner_id).await?;
        tx.commit().await?;
        Ok(buyer)
    }

    #[instrument(skip(self, drafts), fields(rows = drafts.len()))]
    async fn create_many(
        &self,
        drafts: Vec<BuyerDraft>,
        owner_id: &str,
    ) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for draft in drafts {
            insert_with_history(&mut tx, draft, owner_id).await?;
            created += 1;
        }
        tx.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: BuyerId) -> Result<Option<Buyer>, RepositoryError> {
        let sql = format!("SELECT {BUYER_COLUMNS} FROM buyers WHERE id = $1");
        let buyer = sqlx::query_as::<_, Buyer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(buyer)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &BuyerQuery) -> Result<BuyerPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM buyers");
        push_filters(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {total}")))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {SUMMARY_COLUMNS} FROM buyers"));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY updated_at DESC, id LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let buyers = select
            .build_query_as::<BuyerSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(BuyerPage::new(query, total, buyers))
    }

    #[instrument(skip(self, draft))]
    async fn update(
        &self,
        id: BuyerId,
        draft: BuyerDraft,
        changed_by: &str,
    ) -> Result<Buyer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {BUYER_COLUMNS} FROM buyers WHERE id = $1 FOR UPDATE");
        let before = sqlx::query_as::<_, Buyer>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut next = before.clone();
        next.apply(draft, Utc::now())?;

        let sql = format!(
            "UPDATE buyers SET full_name = $2, email = $3, phone = $4, city = $5, \
             property_type = $6, bhk = $7, purpose = $8, budget_min = $9, budget_max = $10, \
             timeline = $11, source = $12, notes = $13, tags = $14, status = $15, updated_at = $16 \
             WHERE id = $1 RETURNING {BUYER_COLUMNS}"
        );
        let after = sqlx::query_as::<_, Buyer>(&sql)
            .bind(id)
            .bind(&next.full_name)
            .bind(&next.email)
            .bind(&next.phone)
            .bind(next.city)
            .bind(next.property_type)
            .bind(next.bhk)
            .bind(next.purpose)
            .bind(next.budget_min)
            .bind(next.budget_max)
            .bind(next.timeline)
            .bind(next.source)
            .bind(&next.notes)
            .bind(&next.tags)
            .bind(next.status)
            .bind(next.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        insert_history(&mut tx, after.id, changed_by, &diff_buyer(&before, &after)).await?;

        tx.commit().await?;
        Ok(after)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: BuyerId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM buyer_history WHERE buyer_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM buyers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn history(&self, id: BuyerId) -> Result<Vec<BuyerHistory>, RepositoryError> {
        let entries = sqlx::query_as::<_, BuyerHistory>(
            r"
            SELECT id, buyer_id, changed_by, changed_at, diff
            FROM buyer_history
            WHERE buyer_id = $1
            ORDER BY changed_at DESC, id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Insert one buyer plus its creation history entry on an open transaction.
async fn insert_with_history(
    conn: &mut PgConnection,
    draft: BuyerDraft,
    owner_id: &str,
) -> Result<Buyer, RepositoryError> {
    let new = Buyer::from_draft(BuyerId::generate(), draft, owner_id, Utc::now());

    let sql = format!(
        "INSERT INTO buyers ({BUYER_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         RETURNING {BUYER_COLUMNS}"
    );
    let buyer = sqlx::query_as::<_, Buyer>(&sql)
        .bind(new.id)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.city)
        .bind(new.property_type)
        .bind(new.bhk)
        .bind(new.purpose)
        .bind(new.budget_min)
        .bind(new.budget_max)
        .bind(new.timeline)
        .bind(new.source)
        .bind(&new.notes)
        .bind(&new.tags)
        .bind(new.status)
        .bind(&new.owner_id)
        .bind(new.created_at)
        .bind(new.updated_at)
        .fetch_one(&mut *conn)
        .await?;

    insert_history(conn, buyer.id, owner_id, &BuyerHistory::created_diff()).await?;

    Ok(buyer)
}

async fn insert_history(
    conn: &mut PgConnection,
    buyer_id: BuyerId,
    changed_by: &str,
    diff: &serde_json::Value,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO buyer_history (id, buyer_id, changed_by, changed_at, diff)
        VALUES ($1, $2, $3, now(), $4)
        ",
    )
    .bind(HistoryId::generate())
    .bind(buyer_id)
    .bind(changed_by)
    .bind(sqlx::types::Json(diff))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Append `WHERE` conditions for the search text and status filter.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BuyerQuery) {
    let mut joiner = " WHERE ";

    if let Some(search) = query.search.as_deref() {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(joiner)
            .push("(full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
        joiner = " AND ";
    }

    if let Some(status) = query.status {
        builder.push(joiner).push("status = ").push_bind(status);
    }
}

/// Escape `LIKE` wildcards so the search text matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use leadbook_core::BuyerStatus;

    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Asha"), "Asha");
    }

    #[test]
    fn test_push_filters_joins_clauses() {
        let query = BuyerQuery {
            search: Some("asha".to_string()),
            status: Some(BuyerStatus::Qualified),
            ..BuyerQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM buyers");
        push_filters(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM buyers WHERE (full_name ILIKE $1 OR email ILIKE $2 OR phone ILIKE $3) AND status = $4"
        );
    }

    #[test]
    fn test_push_filters_without_filters() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM buyers");
        push_filters(&mut builder, &BuyerQuery::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM buyers");
    }
}
