//! Observer port and its implementations.

use super::PipelineEvent;
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Structured logger interface injected into the orchestrators
pub trait PipelineObserver: Send + Sync {
    fn record(&self, event: &PipelineEvent);
}

/// Default observer: one `tracing` event per pipeline event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn record(&self, event: &PipelineEvent) {
        let name = event.name();
        match event {
            PipelineEvent::EnrichmentStarted {
                organization_id,
                requested,
                pending,
                categories,
            } => info!(
                event = name,
                organization_id = %organization_id,
                requested = requested,
                transaction_count = pending,
                categories = categories,
                "Starting transaction enrichment"
            ),
            PipelineEvent::EnrichmentNothingPending {
                organization_id,
                requested,
            } => info!(
                event = name,
                organization_id = %organization_id,
                requested = requested,
                "No transactions need enrichment"
            ),
            PipelineEvent::EnrichmentBatchCompleted {
                organization_id,
                batch_index,
                batch_size,
                updates_applied,
                no_update_needed,
                skipped,
                merchant_names_updated,
                categories_updated,
            } => info!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                batch_size = batch_size,
                updates_applied = updates_applied,
                no_update_needed = no_update_needed,
                skipped = skipped,
                merchant_names_updated = merchant_names_updated,
                categories_updated = categories_updated,
                "Enriched transaction batch"
            ),
            PipelineEvent::ResultCountMismatch {
                organization_id,
                batch_index,
                expected,
                actual,
            } => warn!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                expected_count = expected,
                actual_count = actual,
                "Classifier returned a different number of results than expected"
            ),
            PipelineEvent::WhitelistViolation {
                organization_id,
                batch_index,
                discarded,
            } => warn!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                discarded = discarded,
                "Discarded categories outside the organization whitelist"
            ),
            PipelineEvent::EnrichmentBatchForceCompleted {
                organization_id,
                batch_index,
                batch_size,
                error,
            } => error!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                batch_size = batch_size,
                error = %error,
                "Failed to enrich transaction batch, marked as completed"
            ),
            PipelineEvent::ForceCompletionFailed {
                organization_id,
                batch_index,
                batch_size,
                error,
                original_error,
            } => error!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                batch_size = batch_size,
                mark_error = %error,
                original_error = %original_error,
                "Failed to mark transactions as completed after enrichment error"
            ),
            PipelineEvent::EnrichmentCompleted {
                organization_id,
                enriched_count,
            } => info!(
                event = name,
                organization_id = %organization_id,
                total_enriched = enriched_count,
                "Transaction enrichment completed"
            ),
            PipelineEvent::EnrichmentDependencyFailed {
                organization_id,
                error,
            } => warn!(
                event = name,
                organization_id = %organization_id,
                error = %error,
                "Transaction enrichment failed, proceeding with embedding anyway"
            ),
            PipelineEvent::EnrichmentDependencySucceeded {
                organization_id,
                enriched_count,
            } => info!(
                event = name,
                organization_id = %organization_id,
                enriched_count = enriched_count,
                "Transaction enrichment completed successfully"
            ),
            PipelineEvent::EmbeddingNothingPending {
                organization_id,
                requested,
            } => info!(
                event = name,
                organization_id = %organization_id,
                requested = requested,
                "No transactions need embedding"
            ),
            PipelineEvent::EmbeddingStarted {
                organization_id,
                requested,
                pending,
            } => info!(
                event = name,
                organization_id = %organization_id,
                requested = requested,
                transaction_count = pending,
                "Starting transaction embedding"
            ),
            PipelineEvent::EmptyTextDropped {
                organization_id,
                batch_index,
                transaction_ids,
            } => warn!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                dropped = transaction_ids.len(),
                transaction_ids = ?transaction_ids,
                "Dropped transactions with no text to embed"
            ),
            PipelineEvent::EmbeddingBatchSkipped {
                organization_id,
                batch_index,
                batch_size,
            } => warn!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                batch_size = batch_size,
                "No valid text content in batch"
            ),
            PipelineEvent::EmbeddingBatchCompleted {
                organization_id,
                batch_index,
                inserted,
                model,
            } => info!(
                event = name,
                organization_id = %organization_id,
                batch_index = batch_index,
                batch_size = inserted,
                model = %model,
                "Transaction embeddings batch created"
            ),
            PipelineEvent::EmbeddingCompleted {
                organization_id,
                embedded_count,
            } => info!(
                event = name,
                organization_id = %organization_id,
                total_count = embedded_count,
                "All transaction embeddings created"
            ),
        }
    }
}

/// Keeps every event in memory. Meant for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(PipelineEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }
}

impl PipelineObserver for RecordingObserver {
    fn record(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}
