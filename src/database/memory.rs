//! In-process Persistence Gateway.
//!
//! Mirrors the Postgres semantics (scoping, pending filters, whitelist order,
//! write validation, append-only embeddings) and counts the write calls that
//! actually touched rows, which is what the idempotence checks look at.

use super::TransactionStore;
use crate::error::Result;
use crate::models::{
    CategoryForEnrichment, NewTransactionEmbedding, Transaction, TransactionForEmbedding,
    TransactionForEnrichment, TransactionPatch,
};
use crate::validation::{validate_embeddings, validate_patches, validate_transaction_ids};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredCategory {
    category: CategoryForEnrichment,
    sequence: u64,
    deleted: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    transactions: HashMap<Uuid, Transaction>,
    categories: HashMap<Uuid, Vec<StoredCategory>>,
    embeddings: Vec<NewTransactionEmbedding>,
    category_sequence: u64,
    write_count: usize,
}

impl StoreState {
    /// Unique ids in request order that belong to the organization
    fn scoped<'a>(
        &'a self,
        organization_id: Uuid,
        ids: &'a [Uuid],
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(move |id| seen.insert(**id))
            .filter_map(move |id| self.transactions.get(id))
            .filter(move |tx| tx.organization_id == organization_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    state: RwLock<StoreState>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_transaction(&self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.state.write().transactions.insert(id, transaction);
        id
    }

    pub fn insert_category(&self, organization_id: Uuid, category: CategoryForEnrichment) {
        let mut state = self.state.write();
        state.category_sequence += 1;
        let sequence = state.category_sequence;
        state
            .categories
            .entry(organization_id)
            .or_default()
            .push(StoredCategory {
                category,
                sequence,
                deleted: false,
            });
    }

    /// Soft delete, like setting `deleted_at`
    pub fn delete_category(&self, organization_id: Uuid, slug: &str) {
        if let Some(categories) = self.state.write().categories.get_mut(&organization_id) {
            for stored in categories.iter_mut().filter(|c| c.category.slug == slug) {
                stored.deleted = true;
            }
        }
    }

    pub fn transaction(&self, id: Uuid) -> Option<Transaction> {
        self.state.read().transactions.get(&id).cloned()
    }

    pub fn embeddings(&self) -> Vec<NewTransactionEmbedding> {
        self.state.read().embeddings.clone()
    }

    pub fn embeddings_for(&self, transaction_id: Uuid) -> Vec<NewTransactionEmbedding> {
        self.state
            .read()
            .embeddings
            .iter()
            .filter(|e| e.transaction_id == transaction_id)
            .cloned()
            .collect()
    }

    /// Write calls that changed at least one row
    pub fn write_count(&self) -> usize {
        self.state.read().write_count
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn fetch_pending_for_enrichment(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEnrichment>> {
        let state = self.state.read();
        Ok(state
            .scoped(organization_id, ids)
            .filter(|tx| !tx.enrichment_completed)
            .map(Transaction::for_enrichment)
            .collect())
    }

    async fn fetch_category_whitelist(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<CategoryForEnrichment>> {
        let state = self.state.read();
        let mut categories: Vec<&StoredCategory> = state
            .categories
            .get(&organization_id)
            .map(|all| all.iter().filter(|c| !c.deleted).collect())
            .unwrap_or_default();

        categories.sort_by(|a, b| {
            b.sequence
                .cmp(&a.sequence)
                .then_with(|| a.category.name.cmp(&b.category.name))
        });

        Ok(categories.into_iter().map(|c| c.category.clone()).collect())
    }

    async fn fetch_pending_for_embedding(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<TransactionForEmbedding>> {
        let state = self.state.read();
        let embedded: HashSet<Uuid> = state.embeddings.iter().map(|e| e.transaction_id).collect();
        Ok(state
            .scoped(organization_id, ids)
            .filter(|tx| !embedded.contains(&tx.id))
            .map(Transaction::for_embedding)
            .collect())
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

        let mut state = self.state.write();
        let mut updated = 0;
        for patch in patches {
            if let Some(tx) = state
                .transactions
                .get_mut(&patch.transaction_id)
                .filter(|tx| tx.organization_id == organization_id)
            {
                tx.apply_patch(patch);
                updated += 1;
            }
        }
        if updated > 0 {
            state.write_count += 1;
        }
        Ok(updated)
    }

    async fn mark_enriched(&self, organization_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        validate_transaction_ids(ids)?;

        let mut state = self.state.write();
        let mut updated = 0;
        for id in ids {
            if let Some(tx) = state
                .transactions
                .get_mut(id)
                .filter(|tx| tx.organization_id == organization_id)
            {
                tx.enrichment_completed = true;
                updated += 1;
            }
        }
        if updated > 0 {
            state.write_count += 1;
        }
        Ok(updated)
    }

    async fn bulk_insert_embeddings(&self, rows: &[NewTransactionEmbedding]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        validate_embeddings(rows)?;

        let mut state = self.state.write();
        let mut inserted = 0;
        for row in rows {
            let exists = state
                .embeddings
                .iter()
                .any(|e| e.transaction_id == row.transaction_id && e.model == row.model);
            if !exists {
                state.embeddings.push(row.clone());
                inserted += 1;
            }
        }
        if inserted > 0 {
            state.write_count += 1;
        }
        Ok(inserted)
    }
}
