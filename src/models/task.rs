//! # Task Payloads
//!
//! Inputs and outputs exchanged with the scheduler. Both tasks take the same
//! input shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentTaskInput {
    pub transaction_ids: Vec<Uuid>,
    pub organization_id: Uuid,
}

pub type EmbeddingTaskInput = EnrichmentTaskInput;

impl EnrichmentTaskInput {
    pub fn new(organization_id: Uuid, transaction_ids: Vec<Uuid>) -> Self {
        Self {
            transaction_ids,
            organization_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentTaskOutput {
    pub enriched_count: usize,
    pub organization_id: Uuid,
}
