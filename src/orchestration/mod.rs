//! # Orchestration
//!
//! The two pipeline stages and the scheduler adapter that admits them.
//!
//! ## Flow
//!
//! ```text
//! embed-transactions ──await──▶ enrich-transactions (best effort)
//!         │                              │
//!         ▼                              ▼
//!  pending-for-embedding        pending-for-enrichment
//!         │                              │
//!  batches of 50 ─▶ embedder     batches of 50 ─▶ classifier
//!         │                              │
//!  bulk insert embeddings        reconcile ─▶ patch + mark completed
//! ```
//!
//! Batches inside one run are strictly sequential. Concurrency only exists
//! between runs, bounded per task type by [`task_queue::TaskQueue`].

pub mod batch_processor;
pub mod embedding;
pub mod enrichment;
pub mod outcome;
pub mod task_queue;

pub use batch_processor::{process_in_batches, BatchContext};
pub use embedding::EmbeddingOrchestrator;
pub use enrichment::EnrichmentOrchestrator;
pub use outcome::{reconcile, EnrichmentOutcome, OutcomeSummary, SkipReason, TransactionOutcome};
pub use task_queue::{PipelineTasks, QueuedEnrichment, TaskQueue};

use crate::error::Result;
use crate::models::{EnrichmentTaskInput, EnrichmentTaskOutput};
use async_trait::async_trait;

/// What the embedding stage awaits before it runs. Implemented by the
/// orchestrator itself and by its queued form, which goes through the
/// enrichment task's admission control.
#[async_trait]
pub trait EnrichmentStage: Send + Sync {
    async fn enrich(&self, input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput>;
}
