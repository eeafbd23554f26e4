//! Registered tasks wired through their queues.

mod common;

use async_trait::async_trait;
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use transaction_enrichment::config::PipelineConfig;
use transaction_enrichment::error::Result;
use transaction_enrichment::events::{names, RecordingObserver};
use transaction_enrichment::models::EnrichmentTaskInput;
use transaction_enrichment::orchestration::PipelineTasks;
use transaction_enrichment::providers::Classifier;
use transaction_enrichment::PipelineError;
use uuid::Uuid;

/// Never answers within any reasonable budget
struct StalledClassifier;

#[async_trait]
impl Classifier for StalledClassifier {
    async fn classify(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(json!([]))
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

/// Answers after `delay` with a fixed response
struct SlowClassifier {
    delay: Duration,
    response: Value,
}

#[async_trait]
impl Classifier for SlowClassifier {
    async fn classify(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_default_queues_match_task_registration() {
    let org = Uuid::new_v4();
    let tasks = PipelineTasks::new(
        &PipelineConfig::default(),
        seeded_store(org),
        Arc::new(ScriptedClassifier::new()),
        Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned)),
        Arc::new(RecordingObserver::new()),
    );

    assert_eq!(tasks.enrichment_queue().name(), "enrich-transactions");
    assert_eq!(tasks.enrichment_queue().concurrency_limit(), 2);
    assert_eq!(tasks.enrichment_queue().max_duration(), Duration::from_secs(300));
    assert_eq!(tasks.embedding_queue().name(), "embed-transactions");
    assert_eq!(tasks.embedding_queue().concurrency_limit(), 3);
    assert_eq!(tasks.embedding_queue().max_duration(), Duration::from_secs(180));
}

#[tokio::test]
async fn test_embed_task_runs_enrichment_then_embedding() {
    let org = Uuid::new_v4();
    let store = seeded_store(org);
    let observer = Arc::new(RecordingObserver::new());
    let embedder = Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned));
    let id = TransactionBuilder::new(org, "SPOTIFY P1234").insert(&store);

    let tasks = PipelineTasks::new(
        &PipelineConfig::default(),
        store.clone(),
        Arc::new(
            ScriptedClassifier::new()
                .respond(json!([{"merchant": "Spotify", "category": "streaming"}])),
        ),
        embedder.clone(),
        observer.clone(),
    );

    assert_ok!(tasks.embed(&EnrichmentTaskInput::new(org, vec![id])).await);

    let tx = store.transaction(id).unwrap();
    assert!(tx.enrichment_completed);
    assert_eq!(tx.merchant_name.as_deref(), Some("Spotify"));
    assert_eq!(store.embeddings_for(id).len(), 1);

    let sequence = observer.names();
    let enriched_at = sequence
        .iter()
        .position(|n| *n == names::ENRICHMENT_COMPLETED)
        .unwrap();
    let embedded_at = sequence
        .iter()
        .position(|n| *n == names::EMBEDDING_COMPLETED)
        .unwrap();
    assert!(enriched_at < embedded_at);
}

#[tokio::test]
async fn test_configured_batch_sizes_applied() {
    let org = Uuid::new_v4();
    let store = seeded_store(org);
    let classifier = Arc::new(ScriptedClassifier::new());
    let embedder = Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned));
    let ids: Vec<Uuid> = (0..5)
        .map(|i| TransactionBuilder::new(org, &format!("TX {i}")).insert(&store))
        .collect();

    let mut config = PipelineConfig::default();
    config.batching.enrichment_batch_size = 2;
    config.batching.embedding_batch_size = 4;

    let tasks = PipelineTasks::new(
        &config,
        store.clone(),
        classifier.clone(),
        embedder.clone(),
        Arc::new(RecordingObserver::new()),
    );
    tasks
        .embed(&EnrichmentTaskInput::new(org, ids))
        .await
        .unwrap();

    assert_eq!(classifier.call_count(), 3);
    let embed_calls: Vec<usize> = embedder.calls().iter().map(Vec::len).collect();
    assert_eq!(embed_calls, vec![4, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_budget_expiry_is_reported() {
    let org = Uuid::new_v4();
    let store = seeded_store(org);
    let id = TransactionBuilder::new(org, "SLOW").insert(&store);

    let mut config = PipelineConfig::default();
    config.scheduler.enrichment.max_duration_seconds = 5;

    let tasks = PipelineTasks::new(
        &config,
        store.clone(),
        Arc::new(StalledClassifier),
        Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned)),
        Arc::new(RecordingObserver::new()),
    );

    let result = tasks.enrich(&EnrichmentTaskInput::new(org, vec![id])).await;

    assert!(matches!(
        result,
        Err(PipelineError::TaskTimeout { ref task, .. }) if task == "enrich-transactions"
    ));
    // The run was dropped mid-batch; the row stays pending for the next run
    assert!(!store.transaction(id).unwrap().enrichment_completed);
}

#[tokio::test(start_paused = true)]
async fn test_embedding_proceeds_after_enrichment_timeout() {
    let org = Uuid::new_v4();
    let store = seeded_store(org);
    let id = TransactionBuilder::new(org, "SLOW").insert(&store);
    let observer = Arc::new(RecordingObserver::new());

    let mut config = PipelineConfig::default();
    config.scheduler.enrichment.max_duration_seconds = 5;
    config.scheduler.embedding.max_duration_seconds = 60;

    let tasks = PipelineTasks::new(
        &config,
        store.clone(),
        Arc::new(StalledClassifier),
        Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned)),
        observer.clone(),
    );

    assert_ok!(tasks.embed(&EnrichmentTaskInput::new(org, vec![id])).await);

    assert_eq!(store.embeddings_for(id).len(), 1);
    assert_eq!(observer.count(names::EMBEDDING_ENRICHMENT_FAILED), 1);
}

#[tokio::test(start_paused = true)]
async fn test_embedding_timeout_leaves_enrichment_sub_run_running() {
    let org = Uuid::new_v4();
    let store = seeded_store(org);
    let id = TransactionBuilder::new(org, "SPOTIFY P1234").insert(&store);

    let mut config = PipelineConfig::default();
    config.scheduler.enrichment.max_duration_seconds = 300;
    config.scheduler.embedding.max_duration_seconds = 2;

    let tasks = PipelineTasks::new(
        &config,
        store.clone(),
        Arc::new(SlowClassifier {
            delay: Duration::from_secs(10),
            response: json!([{"merchant": "Spotify"}]),
        }),
        Arc::new(ScriptedEmbedder::new(EmbedderMode::Aligned)),
        Arc::new(RecordingObserver::new()),
    );

    let error = assert_err!(tasks.embed(&EnrichmentTaskInput::new(org, vec![id])).await);
    assert!(matches!(
        error,
        PipelineError::TaskTimeout { ref task, .. } if task == "embed-transactions"
    ));

    // The detached enrichment run finishes under its own budget
    tokio::time::sleep(Duration::from_secs(60)).await;

    let tx = store.transaction(id).unwrap();
    assert!(tx.enrichment_completed);
    assert_eq!(tx.merchant_name.as_deref(), Some("Spotify"));
    assert!(store.embeddings_for(id).is_empty());
    assert_eq!(tasks.enrichment_queue().available_slots(), 2);
}
