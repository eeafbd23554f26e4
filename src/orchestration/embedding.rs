//! # Embedding Orchestrator
//!
//! Awaits enrichment for the same ids (best effort), then embeds every
//! transaction that has no embedding yet. Failures are not force-completed:
//! an unembedded transaction simply stays eligible for the next run.

use super::batch_processor::{process_in_batches, BatchContext};
use super::EnrichmentStage;
use crate::constants::batching::EMBEDDING_BATCH_SIZE;
use crate::database::TransactionStore;
use crate::enrichment::compose_embedding_text;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PipelineObserver};
use crate::models::{EmbeddingTaskInput, NewTransactionEmbedding, TransactionForEmbedding};
use crate::providers::EmbeddingProvider;
use std::sync::Arc;
use uuid::Uuid;

pub struct EmbeddingOrchestrator {
    enrichment: Arc<dyn EnrichmentStage>,
    store: Arc<dyn TransactionStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    observer: Arc<dyn PipelineObserver>,
    batch_size: usize,
}

impl EmbeddingOrchestrator {
    pub fn new(
        enrichment: Arc<dyn EnrichmentStage>,
        store: Arc<dyn TransactionStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            enrichment,
            store,
            embedder,
            observer,
            batch_size: EMBEDDING_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub async fn run(&self, input: &EmbeddingTaskInput) -> Result<()> {
        let organization_id = input.organization_id;

        // Enrichment failure never blocks embedding
        match self.enrichment.enrich(input).await {
            Ok(output) => self.observer.record(&PipelineEvent::EnrichmentDependencySucceeded {
                organization_id,
                enriched_count: output.enriched_count,
            }),
            Err(error) => self.observer.record(&PipelineEvent::EnrichmentDependencyFailed {
                organization_id,
                error: error.to_string(),
            }),
        }

        let pending = self
            .store
            .fetch_pending_for_embedding(organization_id, &input.transaction_ids)
            .await?;

        if pending.is_empty() {
            self.observer.record(&PipelineEvent::EmbeddingNothingPending {
                organization_id,
                requested: input.transaction_ids.len(),
            });
            return Ok(());
        }

        self.observer.record(&PipelineEvent::EmbeddingStarted {
            organization_id,
            requested: input.transaction_ids.len(),
            pending: pending.len(),
        });

        let embedded = process_in_batches(&pending, self.batch_size, move |context, batch| {
            self.embed_batch(organization_id, context, batch)
        })
        .await?;

        self.observer.record(&PipelineEvent::EmbeddingCompleted {
            organization_id,
            embedded_count: embedded.len(),
        });

        Ok(())
    }

    async fn embed_batch(
        &self,
        organization_id: Uuid,
        context: BatchContext,
        batch: &[TransactionForEmbedding],
    ) -> Result<Vec<Uuid>> {
        let mut valid: Vec<(Uuid, String)> = Vec::with_capacity(batch.len());
        let mut dropped = Vec::new();

        for tx in batch {
            let text = compose_embedding_text(tx);
            if text.trim().is_empty() {
                dropped.push(tx.id);
            } else {
                valid.push((tx.id, text));
            }
        }

        if !dropped.is_empty() {
            self.observer.record(&PipelineEvent::EmptyTextDropped {
                organization_id,
                batch_index: context.index,
                transaction_ids: dropped,
            });
        }

        if valid.is_empty() {
            self.observer.record(&PipelineEvent::EmbeddingBatchSkipped {
                organization_id,
                batch_index: context.index,
                batch_size: batch.len(),
            });
            return Ok(Vec::new());
        }

        let texts: Vec<String> = valid.iter().map(|(_, text)| text.clone()).collect();
        let response = self.embedder.embed(&texts).await?;

        // Never pair a vector with the wrong transaction
        if response.embeddings.len() != valid.len() {
            return Err(PipelineError::EmbeddingCountMismatch {
                expected: valid.len(),
                actual: response.embeddings.len(),
            });
        }

        let rows: Vec<NewTransactionEmbedding> = valid
            .into_iter()
            .zip(response.embeddings)
            .map(|((transaction_id, source_text), embedding)| NewTransactionEmbedding {
                transaction_id,
                organization_id,
                embedding,
                source_text,
                model: response.model.clone(),
            })
            .collect();

        self.store.bulk_insert_embeddings(&rows).await?;

        self.observer.record(&PipelineEvent::EmbeddingBatchCompleted {
            organization_id,
            batch_index: context.index,
            inserted: rows.len(),
            model: response.model.clone(),
        });

        Ok(rows.iter().map(|row| row.transaction_id).collect())
    }
}
