//! # Enrichment Orchestrator
//!
//! Classifies pending transactions in batches and guarantees that every
//! transaction of a processed batch ends with `enrichment_completed = true`.
//!
//! ## Batch lifecycle
//!
//! 1. Compose text and build one prompt for the batch
//! 2. One structured-output classifier call
//! 3. Validate the output against the whitelist schema
//! 4. Reconcile positionally into one outcome per transaction
//! 5. Persist: bulk patch, then completion mark
//!
//! If any step fails, a cleanup phase marks the whole batch completed
//! (without data) and the original error is then propagated, which aborts
//! the remaining batches. A retry only sees transactions that are still
//! pending, so re-running is safe.

use super::batch_processor::{process_in_batches, BatchContext};
use super::outcome::{reconcile, OutcomeSummary};
use super::EnrichmentStage;
use crate::constants::batching::ENRICHMENT_BATCH_SIZE;
use crate::database::TransactionStore;
use crate::enrichment::{build_enrichment_prompt, EnrichmentSchema};
use crate::error::Result;
use crate::events::{PipelineEvent, PipelineObserver};
use crate::models::{
    CategoryForEnrichment, EnrichmentTaskInput, EnrichmentTaskOutput, TransactionForEnrichment,
};
use crate::providers::Classifier;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Per-run state shared by all batches
struct RunContext {
    organization_id: Uuid,
    categories: Vec<CategoryForEnrichment>,
    schema: EnrichmentSchema,
    response_schema: Value,
}

pub struct EnrichmentOrchestrator {
    store: Arc<dyn TransactionStore>,
    classifier: Arc<dyn Classifier>,
    observer: Arc<dyn PipelineObserver>,
    batch_size: usize,
}

impl EnrichmentOrchestrator {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        classifier: Arc<dyn Classifier>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            store,
            classifier,
            observer,
            batch_size: ENRICHMENT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn run(&self, input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput> {
        let organization_id = input.organization_id;

        let pending = self
            .store
            .fetch_pending_for_enrichment(organization_id, &input.transaction_ids)
            .await?;

        if pending.is_empty() {
            self.observer.record(&PipelineEvent::EnrichmentNothingPending {
                organization_id,
                requested: input.transaction_ids.len(),
            });
            return Ok(EnrichmentTaskOutput {
                enriched_count: 0,
                organization_id,
            });
        }

        let categories = self.store.fetch_category_whitelist(organization_id).await?;
        let schema = EnrichmentSchema::new(&categories);
        let run = RunContext {
            organization_id,
            response_schema: schema.response_schema(),
            schema,
            categories,
        };

        self.observer.record(&PipelineEvent::EnrichmentStarted {
            organization_id,
            requested: input.transaction_ids.len(),
            pending: pending.len(),
            categories: run.categories.len(),
        });

        let run = &run;
        let enriched = process_in_batches(&pending, self.batch_size, move |context, batch| {
            self.process_batch(run, context, batch)
        })
        .await?;

        self.observer.record(&PipelineEvent::EnrichmentCompleted {
            organization_id,
            enriched_count: enriched.len(),
        });

        Ok(EnrichmentTaskOutput {
            enriched_count: enriched.len(),
            organization_id,
        })
    }

    /// Enrich one batch; on failure run the cleanup phase, then propagate
    async fn process_batch(
        &self,
        run: &RunContext,
        context: BatchContext,
        batch: &[TransactionForEnrichment],
    ) -> Result<Vec<Uuid>> {
        match self.enrich_batch(run, context, batch).await {
            Ok(ids) => Ok(ids),
            Err(error) => {
                self.force_complete(run.organization_id, context, batch, &error.to_string())
                    .await;
                Err(error)
            }
        }
    }

    async fn enrich_batch(
        &self,
        run: &RunContext,
        context: BatchContext,
        batch: &[TransactionForEnrichment],
    ) -> Result<Vec<Uuid>> {
        let organization_id = run.organization_id;
        let prompt = build_enrichment_prompt(batch, &run.categories);

        let output = self
            .classifier
            .classify(&prompt, &run.response_schema)
            .await?;
        let validated = run.schema.validate(&output)?;

        if validated.results.len() != batch.len() {
            self.observer.record(&PipelineEvent::ResultCountMismatch {
                organization_id,
                batch_index: context.index,
                expected: batch.len(),
                actual: validated.results.len(),
            });
        }
        if validated.whitelist_violations > 0 {
            self.observer.record(&PipelineEvent::WhitelistViolation {
                organization_id,
                batch_index: context.index,
                discarded: validated.whitelist_violations,
            });
        }

        let summary = OutcomeSummary::from_outcomes(reconcile(batch, &validated.results));
        summary.apply(self.store.as_ref(), organization_id).await?;

        self.observer.record(&PipelineEvent::EnrichmentBatchCompleted {
            organization_id,
            batch_index: context.index,
            batch_size: batch.len(),
            updates_applied: summary.updates_applied(),
            no_update_needed: summary.no_update_needed,
            skipped: summary.skipped,
            merchant_names_updated: summary.merchant_names_updated,
            categories_updated: summary.categories_updated,
        });

        Ok(summary.transaction_ids())
    }

    /// Cleanup phase: completion without data for the whole batch. A failure
    /// here is recorded but never replaces the original error.
    async fn force_complete(
        &self,
        organization_id: Uuid,
        context: BatchContext,
        batch: &[TransactionForEnrichment],
        error: &str,
    ) {
        let ids: Vec<Uuid> = batch.iter().map(|tx| tx.id).collect();

        match self.store.mark_enriched(organization_id, &ids).await {
            Ok(_) => self.observer.record(&PipelineEvent::EnrichmentBatchForceCompleted {
                organization_id,
                batch_index: context.index,
                batch_size: batch.len(),
                error: error.to_string(),
            }),
            Err(mark_error) => self.observer.record(&PipelineEvent::ForceCompletionFailed {
                organization_id,
                batch_index: context.index,
                batch_size: batch.len(),
                error: mark_error.to_string(),
                original_error: error.to_string(),
            }),
        }
    }
}

#[async_trait]
impl EnrichmentStage for EnrichmentOrchestrator {
    async fn enrich(&self, input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput> {
        self.run(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryTransactionStore;
    use crate::error::PipelineError;
    use crate::events::{names, RecordingObserver};
    use crate::models::{CategoryType, Transaction};
    use bigdecimal::BigDecimal;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::str::FromStr;

    /// Returns queued responses in order, counting calls
    #[derive(Default)]
    struct QueuedClassifier {
        responses: Mutex<Vec<Result<Value>>>,
        calls: Mutex<usize>,
    }

    impl QueuedClassifier {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Classifier for QueuedClassifier {
        async fn classify(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
            *self.calls.lock() += 1;
            self.responses
                .lock()
                .pop()
                .unwrap_or_else(|| Ok(json!([])))
        }

        fn model_name(&self) -> &str {
            "queued"
        }
    }

    fn setup(
        responses: Vec<Result<Value>>,
    ) -> (
        Arc<InMemoryTransactionStore>,
        Arc<QueuedClassifier>,
        Arc<RecordingObserver>,
        EnrichmentOrchestrator,
    ) {
        let store = Arc::new(InMemoryTransactionStore::new());
        let classifier = Arc::new(QueuedClassifier::new(responses));
        let observer = Arc::new(RecordingObserver::new());
        let orchestrator =
            EnrichmentOrchestrator::new(store.clone(), classifier.clone(), observer.clone());
        (store, classifier, observer, orchestrator)
    }

    fn expense(store: &InMemoryTransactionStore, org: Uuid, name: &str) -> Uuid {
        store.insert_transaction(Transaction::new(
            org,
            name,
            BigDecimal::from_str("-10.00").unwrap(),
            "EUR",
        ))
    }

    #[tokio::test]
    async fn test_nothing_pending_returns_zero() {
        let (_, classifier, observer, orchestrator) = setup(vec![]);
        let org = Uuid::new_v4();

        let output = orchestrator
            .run(&EnrichmentTaskInput::new(org, vec![Uuid::new_v4()]))
            .await
            .unwrap();

        assert_eq!(output.enriched_count, 0);
        assert_eq!(*classifier.calls.lock(), 0);
        assert_eq!(observer.count(names::ENRICHMENT_NOTHING_PENDING), 1);
    }

    #[tokio::test]
    async fn test_one_classifier_call_per_batch() {
        let (store, classifier, _, orchestrator) = setup(vec![]);
        let orchestrator = orchestrator.with_batch_size(2);
        let org = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..5).map(|i| expense(&store, org, &format!("TX {i}"))).collect();

        let output = orchestrator
            .run(&EnrichmentTaskInput::new(org, ids.clone()))
            .await
            .unwrap();

        assert_eq!(*classifier.calls.lock(), 3);
        assert_eq!(output.enriched_count, 5);
        assert!(ids
            .iter()
            .all(|id| store.transaction(*id).unwrap().enrichment_completed));
    }

    #[tokio::test]
    async fn test_failed_batch_is_force_completed_and_error_propagates() {
        let (store, classifier, observer, orchestrator) = setup(vec![
            Ok(json!([{"merchant": "A", "category": null}, {"merchant": "B", "category": null}])),
            Err(PipelineError::provider("test", "rate limited")),
        ]);
        let orchestrator = orchestrator.with_batch_size(2);
        let org = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..6).map(|i| expense(&store, org, &format!("TX {i}"))).collect();

        let result = orchestrator.run(&EnrichmentTaskInput::new(org, ids.clone())).await;

        assert!(matches!(result, Err(PipelineError::Provider { .. })));
        assert_eq!(*classifier.calls.lock(), 2);
        // First two enriched, next two force-completed, last batch never started
        assert_eq!(store.transaction(ids[0]).unwrap().merchant_name.as_deref(), Some("A"));
        assert!(store.transaction(ids[2]).unwrap().enrichment_completed);
        assert!(store.transaction(ids[3]).unwrap().merchant_name.is_none());
        assert!(!store.transaction(ids[4]).unwrap().enrichment_completed);
        assert_eq!(observer.count(names::ENRICHMENT_BATCH_FORCE_COMPLETED), 1);
    }

    #[tokio::test]
    async fn test_whitelist_violation_recorded() {
        let (store, _, observer, orchestrator) = setup(vec![Ok(json!([
            {"merchant": "Foo", "category": "nonexistent-slug"}
        ]))]);
        let org = Uuid::new_v4();
        store.insert_category(
            org,
            CategoryForEnrichment::new("groceries", "Groceries", CategoryType::Expense),
        );
        let id = expense(&store, org, "FOO 1");

        orchestrator
            .run(&EnrichmentTaskInput::new(org, vec![id]))
            .await
            .unwrap();

        let tx = store.transaction(id).unwrap();
        assert_eq!(tx.merchant_name.as_deref(), Some("Foo"));
        assert!(tx.category_slug.is_none());
        assert_eq!(observer.count(names::ENRICHMENT_WHITELIST_VIOLATION), 1);
    }
}
