//! Quotation documents kept as JSON in SQLite.

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Quotation, QuotationId, QuotationStatus, RateOffer, StatusChange};

use super::error::{StoreError, UpdateOutcome};

/// Document store for quotations.
///
/// Quotations are never deleted. Every status change goes through
/// [`QuotationStatus::transition_to`], so the status only moves forward.
#[async_trait]
pub trait QuotationStore: Send + Sync {
    /// Insert a new draft. Never overwrites an existing id.
    async fn insert_draft(&self, quotation: &Quotation) -> Result<QuotationId, StoreError>;

    /// Replace the rate offers and move the quotation to `Rated`.
    async fn attach_rates(
        &self,
        id: QuotationId,
        rates: Vec<RateOffer>,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Move the quotation to `Saved`. Saving twice is `Unchanged`.
    async fn mark_saved(&self, id: QuotationId) -> Result<UpdateOutcome, StoreError>;

    /// Fetch a quotation in any status.
    async fn get(&self, id: QuotationId) -> Result<Option<Quotation>, StoreError>;

    /// Fetch a quotation only if it has been saved.
    async fn get_saved(&self, id: QuotationId) -> Result<Option<Quotation>, StoreError>;

    /// Stream quotations, oldest first, optionally filtered by status.
    ///
    /// The stream is finite. Call again to restart from the beginning.
    fn list(&self, status: Option<QuotationStatus>)
    -> BoxStream<'_, Result<Quotation, StoreError>>;
}

/// [`QuotationStore`] backed by the `quotations` table.
#[derive(Clone)]
pub struct SqliteQuotationStore {
    pool: SqlitePool,
}

impl SqliteQuotationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load, check the transition, modify and write back in one transaction.
    async fn transition(
        &self,
        id: QuotationId,
        next: QuotationStatus,
        modify: impl FnOnce(&mut Quotation) + Send,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT document FROM quotations WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(UpdateOutcome::NoMatch);
        };
        let mut quotation = decode(&row)?;

        if quotation.status.transition_to(next)? == StatusChange::Unchanged {
            return Ok(UpdateOutcome::Unchanged);
        }

        quotation.status = next;
        modify(&mut quotation);
        let document = serde_json::to_string(&quotation)?;

        sqlx::query(
            "UPDATE quotations SET status = ?1, document = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(next.as_str())
        .bind(document)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(quotation_id = %id, status = %next, "quotation updated");
        Ok(UpdateOutcome::Updated)
    }

    async fn fetch(&self, sql: &str, id: QuotationId) -> Result<Option<Quotation>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode).transpose()
    }
}

fn decode(row: &SqliteRow) -> Result<Quotation, StoreError> {
    let document: String = row.try_get("document")?;
    Ok(serde_json::from_str(&document)?)
}

#[async_trait]
impl QuotationStore for SqliteQuotationStore {
    async fn insert_draft(&self, quotation: &Quotation) -> Result<QuotationId, StoreError> {
        let document = serde_json::to_string(quotation)?;
        let created_at = quotation.created_at.to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO quotations (id, status, document, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(quotation.id.to_string())
        .bind(quotation.status.as_str())
        .bind(document)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(quotation_id = %quotation.id, "draft quotation stored");
                Ok(quotation.id)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateQuotation(quotation.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn attach_rates(
        &self,
        id: QuotationId,
        rates: Vec<RateOffer>,
    ) -> Result<UpdateOutcome, StoreError> {
        self.transition(id, QuotationStatus::Rated, move |q| {
            q.shipping_rates = rates;
        })
        .await
    }

    async fn mark_saved(&self, id: QuotationId) -> Result<UpdateOutcome, StoreError> {
        self.transition(id, QuotationStatus::Saved, |_| {}).await
    }

    async fn get(&self, id: QuotationId) -> Result<Option<Quotation>, StoreError> {
        self.fetch("SELECT document FROM quotations WHERE id = ?1", id)
            .await
    }

    async fn get_saved(&self, id: QuotationId) -> Result<Option<Quotation>, StoreError> {
        self.fetch(
            "SELECT document FROM quotations WHERE id = ?1 AND status = 'Saved'",
            id,
        )
        .await
    }

    fn list(
        &self,
        status: Option<QuotationStatus>,
    ) -> BoxStream<'_, Result<Quotation, StoreError>> {
        sqlx::query(
            r#"
            SELECT document FROM quotations
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at, id
            "#,
        )
        .bind(status.map(QuotationStatus::as_str))
        .fetch(&self.pool)
        .map(|row| decode(&row?))
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use futures::TryStreamExt;

    use super::*;
    use crate::carrier::fixtures::{address, package};
    use crate::carrier::sample_rates;
    use crate::domain::QuoteRequest;
    use crate::store::schema::test_pool;

    fn draft() -> Quotation {
        let request = QuoteRequest::new(
            address("Receiver", "Fresno", "93650"),
            address("Sender", "Oxnard", "93030"),
            vec![package("Non-Document", "5", "10", "8", "2")],
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            1,
        )
        .unwrap();
        Quotation::draft(&request)
    }

    async fn store() -> SqliteQuotationStore {
        SqliteQuotationStore::new(test_pool().await)
    }

    #[tokio::test]
    async fn draft_is_visible_but_not_saved() {
        let store = store().await;
        let quotation = draft();
        let id = store.insert_draft(&quotation).await.unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded, quotation);
        assert_eq!(loaded.status, QuotationStatus::Draft);
        assert!(store.get_saved(id).await.unwrap().is_none());

        assert_eq!(store.mark_saved(id).await.unwrap(), UpdateOutcome::Updated);
        let saved = store.get_saved(id).await.unwrap().unwrap();
        assert_eq!(saved.status, QuotationStatus::Saved);
    }

    #[tokio::test]
    async fn insert_never_overwrites() {
        let store = store().await;
        let quotation = draft();
        store.insert_draft(&quotation).await.unwrap();

        let err = store.insert_draft(&quotation).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateQuotation(id) if id == quotation.id));
    }

    #[tokio::test]
    async fn attach_rates_moves_to_rated() {
        let store = store().await;
        let id = store.insert_draft(&draft()).await.unwrap();

        let outcome = store.attach_rates(id, sample_rates()).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuotationStatus::Rated);
        assert_eq!(loaded.shipping_rates, sample_rates());
    }

    #[tokio::test]
    async fn rerating_replaces_rates() {
        let store = store().await;
        let id = store.insert_draft(&draft()).await.unwrap();
        store.attach_rates(id, sample_rates()).await.unwrap();

        let first_only = sample_rates().into_iter().take(1).collect::<Vec<_>>();
        store.attach_rates(id, first_only.clone()).await.unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.shipping_rates, first_only);
    }

    #[tokio::test]
    async fn saved_quotation_refuses_rates() {
        let store = store().await;
        let id = store.insert_draft(&draft()).await.unwrap();
        store.attach_rates(id, sample_rates()).await.unwrap();
        store.mark_saved(id).await.unwrap();

        for _ in 0..2 {
            let err = store.attach_rates(id, Vec::new()).await.unwrap_err();
            assert!(matches!(err, StoreError::Rejected(_)));
        }

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuotationStatus::Saved);
        assert_eq!(loaded.shipping_rates, sample_rates());
    }

    #[tokio::test]
    async fn saving_twice_is_unchanged() {
        let store = store().await;
        let id = store.insert_draft(&draft()).await.unwrap();

        assert_eq!(store.mark_saved(id).await.unwrap(), UpdateOutcome::Updated);
        assert_eq!(store.mark_saved(id).await.unwrap(), UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn unknown_id_is_no_match() {
        let store = store().await;
        let id = QuotationId::generate();

        assert_eq!(store.mark_saved(id).await.unwrap(), UpdateOutcome::NoMatch);
        assert_eq!(
            store.attach_rates(id, sample_rates()).await.unwrap(),
            UpdateOutcome::NoMatch
        );
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_restarts() {
        let store = store().await;
        let a = store.insert_draft(&draft()).await.unwrap();
        let b = store.insert_draft(&draft()).await.unwrap();
        store.mark_saved(b).await.unwrap();

        let all: Vec<Quotation> = store.list(None).try_collect().await.unwrap();
        assert_eq!(all.len(), 2);

        let saved: Vec<Quotation> = store
            .list(Some(QuotationStatus::Saved))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(saved.iter().map(|q| q.id).collect::<Vec<_>>(), vec![b]);

        let drafts: Vec<Quotation> = store
            .list(Some(QuotationStatus::Draft))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(drafts.iter().map(|q| q.id).collect::<Vec<_>>(), vec![a]);

        let again: Vec<Quotation> = store.list(None).try_collect().await.unwrap();
        assert_eq!(again, all);
    }

    #[tokio::test]
    async fn legacy_unsaved_documents_read_as_draft() {
        let store = store().await;
        let quotation = draft();
        let mut document = serde_json::to_value(&quotation).unwrap();
        document["status"] = "unsaved".into();

        sqlx::query(
            "INSERT INTO quotations (id, status, document, created_at, updated_at) VALUES (?1, 'Draft', ?2, ?3, ?3)",
        )
        .bind(quotation.id.to_string())
        .bind(document.to_string())
        .bind(quotation.created_at.to_rfc3339())
        .execute(&store.pool)
        .await
        .unwrap();

        let loaded = store.get(quotation.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuotationStatus::Draft);
        assert_eq!(
            store.attach_rates(quotation.id, sample_rates()).await.unwrap(),
            UpdateOutcome::Updated
        );
    }
}
