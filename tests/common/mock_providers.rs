//! Scripted classifier and embedder doubles

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use transaction_enrichment::error::{PipelineError, Result};
use transaction_enrichment::models::{EmbeddingBatch, EnrichmentTaskInput, EnrichmentTaskOutput};
use transaction_enrichment::orchestration::EnrichmentStage;
use transaction_enrichment::providers::{Classifier, EmbeddingProvider};

/// Recorded classifier call
#[derive(Debug, Clone)]
pub struct ClassifierCall {
    pub prompt: String,
    pub schema: Value,
}

/// Classifier returning queued responses in order. Once the script runs
/// out it answers with an empty array.
#[derive(Default)]
pub struct ScriptedClassifier {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<ClassifierCall>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Value) -> Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .push_back(Err(PipelineError::provider("scripted", message)));
        self
    }

    pub fn calls(&self) -> Vec<ClassifierCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, prompt: &str, response_schema: &Value) -> Result<Value> {
        self.calls.lock().push(ClassifierCall {
            prompt: prompt.to_string(),
            schema: response_schema.clone(),
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Array(Vec::new())))
    }

    fn model_name(&self) -> &str {
        "scripted-classifier"
    }
}

#[derive(Debug, Clone, Copy)]
pub enum EmbedderMode {
    /// One vector per text
    Aligned,
    /// Always `n` fewer vectors than texts
    Short(usize),
    Failing,
}

/// Embedder producing `[index, text length]` vectors
pub struct ScriptedEmbedder {
    mode: EmbedderMode,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEmbedder {
    pub const MODEL: &'static str = "scripted-embedding";

    pub fn new(mode: EmbedderMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        self.calls.lock().push(texts.to_vec());

        let vectors: Vec<Vec<f32>> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| vec![i as f32, text.len() as f32])
            .collect();

        let embeddings = match self.mode {
            EmbedderMode::Aligned => vectors,
            EmbedderMode::Short(missing) => {
                vectors[..vectors.len().saturating_sub(missing)].to_vec()
            }
            EmbedderMode::Failing => {
                return Err(PipelineError::provider("scripted", "embedding service down"))
            }
        };

        Ok(EmbeddingBatch {
            embeddings,
            model: Self::MODEL.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        Self::MODEL
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Enrichment stage that always fails
pub struct FailingEnrichment;

#[async_trait]
impl EnrichmentStage for FailingEnrichment {
    async fn enrich(&self, _input: &EnrichmentTaskInput) -> Result<EnrichmentTaskOutput> {
        Err(PipelineError::provider("scripted", "enrichment unavailable"))
    }
}
