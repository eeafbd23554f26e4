//! # Pipeline Events
//!
//! Observable moments of the enrichment and embedding runs. Orchestrators
//! never call `tracing` directly; they hand a [`PipelineEvent`] to an injected
//! [`PipelineObserver`], which keeps the control flow testable without a
//! logging backend.

pub mod observer;
pub mod publisher;

pub use observer::{PipelineObserver, RecordingObserver, TracingObserver};
pub use publisher::{EventPublisher, PublishedEvent};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event names, stable for log search and subscribers
pub mod names {
    pub const ENRICHMENT_STARTED: &str = "enrichment.started";
    pub const ENRICHMENT_NOTHING_PENDING: &str = "enrichment.nothing_pending";
    pub const ENRICHMENT_BATCH_COMPLETED: &str = "enrichment.batch_completed";
    pub const ENRICHMENT_RESULT_COUNT_MISMATCH: &str = "enrichment.result_count_mismatch";
    pub const ENRICHMENT_WHITELIST_VIOLATION: &str = "enrichment.whitelist_violation";
    pub const ENRICHMENT_BATCH_FORCE_COMPLETED: &str = "enrichment.batch_force_completed";
    pub const ENRICHMENT_FORCE_COMPLETION_FAILED: &str = "enrichment.force_completion_failed";
    pub const ENRICHMENT_COMPLETED: &str = "enrichment.completed";
    pub const EMBEDDING_ENRICHMENT_FAILED: &str = "embedding.enrichment_failed";
    pub const EMBEDDING_ENRICHMENT_SUCCEEDED: &str = "embedding.enrichment_succeeded";
    pub const EMBEDDING_NOTHING_PENDING: &str = "embedding.nothing_pending";
    pub const EMBEDDING_STARTED: &str = "embedding.started";
    pub const EMBEDDING_EMPTY_TEXT_DROPPED: &str = "embedding.empty_text_dropped";
    pub const EMBEDDING_BATCH_SKIPPED: &str = "embedding.batch_skipped";
    pub const EMBEDDING_BATCH_COMPLETED: &str = "embedding.batch_completed";
    pub const EMBEDDING_COMPLETED: &str = "embedding.completed";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    EnrichmentStarted {
        organization_id: Uuid,
        requested: usize,
        pending: usize,
        categories: usize,
    },
    EnrichmentNothingPending {
        organization_id: Uuid,
        requested: usize,
    },
    EnrichmentBatchCompleted {
        organization_id: Uuid,
        batch_index: usize,
        batch_size: usize,
        updates_applied: usize,
        no_update_needed: usize,
        skipped: usize,
        merchant_names_updated: usize,
        categories_updated: usize,
    },
    ResultCountMismatch {
        organization_id: Uuid,
        batch_index: usize,
        expected: usize,
        actual: usize,
    },
    WhitelistViolation {
        organization_id: Uuid,
        batch_index: usize,
        discarded: usize,
    },
    EnrichmentBatchForceCompleted {
        organization_id: Uuid,
        batch_index: usize,
        batch_size: usize,
        error: String,
    },
    ForceCompletionFailed {
        organization_id: Uuid,
        batch_index: usize,
        batch_size: usize,
        error: String,
        original_error: String,
    },
    EnrichmentCompleted {
        organization_id: Uuid,
        enriched_count: usize,
    },
    EnrichmentDependencyFailed {
        organization_id: Uuid,
        error: String,
    },
    EnrichmentDependencySucceeded {
        organization_id: Uuid,
        enriched_count: usize,
    },
    EmbeddingNothingPending {
        organization_id: Uuid,
        requested: usize,
    },
    EmbeddingStarted {
        organization_id: Uuid,
        requested: usize,
        pending: usize,
    },
    EmptyTextDropped {
        organization_id: Uuid,
        batch_index: usize,
        transaction_ids: Vec<Uuid>,
    },
    EmbeddingBatchSkipped {
        organization_id: Uuid,
        batch_index: usize,
        batch_size: usize,
    },
    EmbeddingBatchCompleted {
        organization_id: Uuid,
        batch_index: usize,
        inserted: usize,
        model: String,
    },
    EmbeddingCompleted {
        organization_id: Uuid,
        embedded_count: usize,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::EnrichmentStarted { .. } => names::ENRICHMENT_STARTED,
            PipelineEvent::EnrichmentNothingPending { .. } => names::ENRICHMENT_NOTHING_PENDING,
            PipelineEvent::EnrichmentBatchCompleted { .. } => names::ENRICHMENT_BATCH_COMPLETED,
            PipelineEvent::ResultCountMismatch { .. } => names::ENRICHMENT_RESULT_COUNT_MISMATCH,
            PipelineEvent::WhitelistViolation { .. } => names::ENRICHMENT_WHITELIST_VIOLATION,
            PipelineEvent::EnrichmentBatchForceCompleted { .. } => {
                names::ENRICHMENT_BATCH_FORCE_COMPLETED
            }
            PipelineEvent::ForceCompletionFailed { .. } => {
                names::ENRICHMENT_FORCE_COMPLETION_FAILED
            }
            PipelineEvent::EnrichmentCompleted { .. } => names::ENRICHMENT_COMPLETED,
            PipelineEvent::EnrichmentDependencyFailed { .. } => names::EMBEDDING_ENRICHMENT_FAILED,
            PipelineEvent::EnrichmentDependencySucceeded { .. } => {
                names::EMBEDDING_ENRICHMENT_SUCCEEDED
            }
            PipelineEvent::EmbeddingNothingPending { .. } => names::EMBEDDING_NOTHING_PENDING,
            PipelineEvent::EmbeddingStarted { .. } => names::EMBEDDING_STARTED,
            PipelineEvent::EmptyTextDropped { .. } => names::EMBEDDING_EMPTY_TEXT_DROPPED,
            PipelineEvent::EmbeddingBatchSkipped { .. } => names::EMBEDDING_BATCH_SKIPPED,
            PipelineEvent::EmbeddingBatchCompleted { .. } => names::EMBEDDING_BATCH_COMPLETED,
            PipelineEvent::EmbeddingCompleted { .. } => names::EMBEDDING_COMPLETED,
        }
    }
}
