//! # Persistence Gateway
//!
//! The six reads and writes the pipeline needs, behind one async trait so the
//! orchestrators never see SQL.
//!
//! ## Implementations
//!
//! - [`PgTransactionStore`] - PostgreSQL via `sqlx`, with pgvector for embeddings
//! - [`InMemoryTransactionStore`] - same semantics over in-process maps
//!
//! ## Guarantees
//!
//! - Every operation is scoped to one organization
//! - Empty input is a no-op (empty result, zero rows written) and never
//!   reaches the database
//! - Writes are validated with [`crate::validation`] before any row changes
//! - Each write call is atomic on its own; nothing spans batches

pub mod connection;
pub mod memory;
pub mod postgres;

pub use connection::DatabaseConnection;
pub use memory::InMemoryTransactionStore;
pub use postgres::PgTransactionStore;

use crate::error::Result;
use crate::models::{
    CategoryForEnrichment, NewTransactionEmbedding, TransactionForEmbedding,
    TransactionForEnrichment, TransactionPatch,
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Rows among `ids` whose `enrichment_completed` is still false
    async fn fetch_pending_for_enrichment(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEnrichment>>;

    /// Non-deleted categories of the organization, newest first then by name
    async fn fetch_category_whitelist(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<CategoryForEnrichment>>;

    /// Rows among `ids` without any embedding record
    async fn fetch_pending_for_embedding(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEmbedding>>;

    /// Apply merchant/category patches and set `enrichment_completed`.
    /// Returns the number of rows updated.
    async fn bulk_patch_transactions(
        &self,
        organization_id: Uuid,
        patches: &[TransactionPatch],
    ) -> Result<u64>;

    /// Set `enrichment_completed` without touching any other column
    async fn mark_enriched(&self, organization_id: Uuid, ids: &[Uuid]) -> Result<u64>;

    /// Append embedding rows. Returns the number of rows inserted.
    async fn bulk_insert_embeddings(&self, rows: &[NewTransactionEmbedding]) -> Result<u64>;
}
