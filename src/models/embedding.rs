//! # Transaction Embedding Model
//!
//! Append-only vectors used for semantic search. One row per
//! (transaction, model) pair.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row handed to the bulk insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionEmbedding {
    pub transaction_id: Uuid,
    pub organization_id: Uuid,
    pub embedding: Vec<f32>,
    pub source_text: String,
    pub model: String,
}

impl NewTransactionEmbedding {
    /// pgvector text literal, e.g. `[0.1,0.2]`
    pub fn vector_literal(&self) -> String {
        let values: Vec<String> = self.embedding.iter().map(|v| v.to_string()).collect();
        format!("[{}]", values.join(","))
    }
}

/// Provider response: vectors aligned by position with the submitted texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingBatch {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
}
