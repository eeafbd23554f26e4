//! # Model Providers
//!
//! Ports for the two metered services the pipeline calls, plus the Gemini
//! client that implements both. A single client is built at startup and
//! shared by the orchestrators as `Arc<dyn Classifier>` and
//! `Arc<dyn EmbeddingProvider>`.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use crate::models::EmbeddingBatch;
use async_trait::async_trait;

/// Structured-output language model.
///
/// The returned value is untrusted: callers validate it against the schema
/// they sent before using any of it.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        prompt: &str,
        response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    fn model_name(&self) -> &str;
}

/// Batch text embedding.
///
/// Vectors in the returned batch are aligned by position with `texts`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch>;

    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;
}
