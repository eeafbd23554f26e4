//! PostgreSQL implementation of the Persistence Gateway.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database. Embedding vectors travel as pgvector text
//! literals and are cast on insert.

use super::TransactionStore;
use crate::error::Result;
use crate::models::{
    CategoryForEnrichment, NewTransactionEmbedding, TransactionForEmbedding,
    TransactionForEnrichment, TransactionPatch,
};
use crate::validation::{validate_embeddings, validate_patches, validate_transaction_ids};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const PENDING_FOR_ENRICHMENT_SQL: &str = r#"
    SELECT id, name, counterparty_name, description, amount, currency,
           category_slug, merchant_name
    FROM transactions
    WHERE organization_id = $1
      AND id = ANY($2)
      AND enrichment_completed = false
    ORDER BY created_at, id
"#;

const CATEGORY_WHITELIST_SQL: &str = r#"
    SELECT c.slug, c.name, c.description, c.type, p.slug AS parent_slug
    FROM transaction_categories c
    LEFT JOIN transaction_categories p ON c.parent_id = p.id
    WHERE c.organization_id = $1
      AND c.deleted_at IS NULL
    ORDER BY c.created_at DESC, c.name ASC
"#;

const PENDING_FOR_EMBEDDING_SQL: &str = r#"
    SELECT t.id, t.name, t.counterparty_name, t.description, t.merchant_name
    FROM transactions t
    WHERE t.organization_id = $1
      AND t.id = ANY($2)
      AND NOT EXISTS (
          SELECT 1 FROM transaction_embeddings e WHERE e.transaction_id = t.id
      )
    ORDER BY t.created_at, t.id
"#;

const PATCH_TRANSACTION_SQL: &str = r#"
    UPDATE transactions
    SET merchant_name = COALESCE($3, merchant_name),
        category_slug = COALESCE($4, category_slug),
        enrichment_completed = true,
        updated_at = NOW()
    WHERE id = $1 AND organization_id = $2
"#;

const MARK_ENRICHED_SQL: &str = r#"
    UPDATE transactions
    SET enrichment_completed = true,
        updated_at = NOW()
    WHERE id = ANY($1) AND organization_id = $2
"#;

const INSERT_EMBEDDING_SQL: &str = r#"
    INSERT INTO transaction_embeddings
        (transaction_id, organization_id, embedding, source_text, model)
    VALUES ($1, $2, $3::vector, $4, $5)
    ON CONFLICT (transaction_id, model) DO NOTHING
"#;

#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn fetch_pending_for_enrichment(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEnrichment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TransactionForEnrichment>(PENDING_FOR_ENRICHMENT_SQL)
            .bind(organization_id)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_category_whitelist(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<CategoryForEnrichment>> {
        let rows = sqlx::query_as::<_, CategoryForEnrichment>(CATEGORY_WHITELIST_SQL)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_pending_for_embedding(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEmbedding>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TransactionForEmbedding>(PENDING_FOR_EMBEDDING_SQL)
            .bind(organization_id)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn bulk_patch_transactions(
        &self,
        organization_id: Uuid,
        patches: &[TransactionPatch],
    ) -> Result<u64> {
        if patches.is_empty() {
            return Ok(0);
        }
        validate_patches(patches)?;

        let mut tx = self.pool.begin().await?;
        let mut updated = 0;
        for patch in patches {
            let result = sqlx::query(PATCH_TRANSACTION_SQL)
                .bind(patch.transaction_id)
                .bind(organization_id)
                .bind(patch.merchant_name.as_deref())
                .bind(patch.category_slug.as_deref())
                .execute(&mut *tx)
                .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;

        debug!(
            organization_id = %organization_id,
            requested = patches.len(),
            updated = updated,
            "Applied transaction patches"
        );
        Ok(updated)
    }

    async fn mark_enriched(&self, organization_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        validate_transaction_ids(ids)?;

        let result = sqlx::query(MARK_ENRICHED_SQL)
            .bind(ids)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn bulk_insert_embeddings(&self, rows: &[NewTransactionEmbedding]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        validate_embeddings(rows)?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(INSERT_EMBEDDING_SQL)
                .bind(row.transaction_id)
                .bind(row.organization_id)
                .bind(row.vector_literal())
                .bind(&row.source_text)
                .bind(&row.model)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_store() -> PgTransactionStore {
        // Never connects unless a query is issued
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://nobody@127.0.0.1:1/unused")
            .unwrap();
        PgTransactionStore::new(pool)
    }

    #[tokio::test]
    async fn test_empty_inputs_never_reach_database() {
        let store = lazy_store();
        let org = Uuid::new_v4();

        assert!(store
            .fetch_pending_for_enrichment(org, &[])
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .fetch_pending_for_embedding(org, &[])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.bulk_patch_transactions(org, &[]).await.unwrap(), 0);
        assert_eq!(store.mark_enriched(org, &[]).await.unwrap(), 0);
        assert_eq!(store.bulk_insert_embeddings(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_patch_rejected_before_database() {
        let store = lazy_store();
        let patch = TransactionPatch {
            transaction_id: Uuid::new_v4(),
            merchant_name: None,
            category_slug: None,
        };
        let result = store.bulk_patch_transactions(Uuid::new_v4(), &[patch]).await;
        assert!(matches!(
            result,
            Err(crate::error::PipelineError::Validation(_))
        ));
    }
}
