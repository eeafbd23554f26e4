//! # Task Queues
//!
//! Scheduler-side admission control. Each task type gets a concurrency
//! ceiling (a tokio `Semaphore`) and a wall-clock budget
//! (`tokio::time::timeout`). Budget expiry drops the in-flight run: work
//! already committed stays committed, and an enrichment sub-run that the
//! embedding task started is not retracted. Retries belong to the external
//! scheduler.

use super::{EmbeddingOrchestrator, EnrichmentOrchestrator, EnrichmentStage};
use crate::config::{PipelineConfig, QueueConfig};
use crate::constants::tasks;
use crate::database::TransactionStore;
use crate::error::{PipelineError, Result};
use crate::events::PipelineObserver;
use crate::models::{EmbeddingTaskInput, EnrichmentTaskInput, EnrichmentTaskOutput};
use crate::providers::{Classifier, EmbeddingProvider};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct TaskQueue {
    name: String,
    semaphore: Arc<Semaphore>,
    concurrency_limit: usize,
    max_duration: Duration,
}

impl TaskQueue {
    pub fn new(name: impl Into<String>, config: QueueConfig) -> Self {
        Self {
            name: name.into(),
            semaphore: Arc::new(Semaphore::new(config.concurrency_limit)),
            concurrency_limit: config.concurrency_limit,
            max_duration: config.max_duration(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Runs not currently admitted slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot, then run `task` within the budget. The budget starts
    /// once the slot is granted.
    pub async fn run<T, F>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            PipelineError::Concurrency(format!("{} queue closed: {e}", self.name))
        })?;

        let started = Instant::now();
        debug!(task = %self.name, "Task admitted");

        match timeout(self.max_duration, task).await {
            Ok(result) => {
                info!(
                    task = %self.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    success = result.is_ok(),
                    "Task finished"
                );
                result
            }
            Err(_) => {
                warn!(
                    task = %self.name,
                    budget_seconds = self.max_duration.as_secs(),
                    "Task exceeded its time budget"
                );
                Err(PipelineError::TaskTimeout {
                    task: self.name.clone(),
                    budget: self.max_duration,
                })
            }
        }
    }
}

/// Enrichment as the embedding task sees it: through the enrichment queue,
/// on its own tokio task. Dropping the caller detaches the sub-run, which
/// then finishes (or times out) under the enrichment budget.
pub struct QueuedEnrichment {
    queue: Arc<TaskQueue>,
    orchestrator: Arc<EnrichmentOrchestrator>,
}

impl QueuedEnrichment {
    pub fn new(queue: Arc<TaskQueue>, orchestrator: Arc<EnrichmentOrchestrator>) -> Self {
        Self {
            queue,
            orchestrator,
        }
    }
}

#[async_trait]
impl EnrichmentStage for QueuedEnrichment {
    async fn enrich(&self, input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput> {
        let queue = Arc::clone(&self.queue);
        let orchestrator = Arc::clone(&self.orchestrator);
        let input = input.clone();

        let handle = tokio::spawn(async move { queue.run(orchestrator.run(&input)).await });

        handle.await.map_err(|e| {
            PipelineError::Concurrency(format!(
                "{} sub-run failed to join: {e}",
                tasks::ENRICH_TRANSACTIONS
            ))
        })?
    }
}

/// The two registered tasks, wired to one store, one classifier and one
/// embedder shared by both stages
pub struct PipelineTasks {
    enrichment: Arc<QueuedEnrichment>,
    embedding_queue: TaskQueue,
    embedding: EmbeddingOrchestrator,
}

impl PipelineTasks {
    pub fn new(
        config: &PipelineConfig,
        store: Arc<dyn TransactionStore>,
        classifier: Arc<dyn Classifier>,
        embedder: Arc<dyn EmbeddingProvider>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        let enrichment_orchestrator = Arc::new(
            EnrichmentOrchestrator::new(store.clone(), classifier, observer.clone())
                .with_batch_size(config.batching.enrichment_batch_size),
        );
        let enrichment = Arc::new(QueuedEnrichment::new(
            Arc::new(TaskQueue::new(
                tasks::ENRICH_TRANSACTIONS,
                config.scheduler.enrichment,
            )),
            enrichment_orchestrator,
        ));

        let embedding = EmbeddingOrchestrator::new(enrichment.clone(), store, embedder, observer)
            .with_batch_size(config.batching.embedding_batch_size);

        Self {
            enrichment,
            embedding_queue: TaskQueue::new(tasks::EMBED_TRANSACTIONS, config.scheduler.embedding),
            embedding,
        }
    }

    /// `enrich-transactions`
    pub async fn enrich(&self, input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput> {
        self.enrichment.enrich(input).await
    }

    /// `embed-transactions`
    pub async fn embed(&self, input: &EmbeddingTaskInput) -> Result<()> {
        self.embedding_queue.run(self.embedding.run(input)).await
    }

    pub fn enrichment_queue(&self) -> &TaskQueue {
        &self.enrichment.queue
    }

    pub fn embedding_queue(&self) -> &TaskQueue {
        &self.embedding_queue
    }
}
