//! # Pipeline Constants
//!
//! Operational boundaries of the enrichment and embedding pipeline.

/// Task identifiers as registered with the scheduler
pub mod tasks {
    pub const ENRICH_TRANSACTIONS: &str = "enrich-transactions";
    pub const EMBED_TRANSACTIONS: &str = "embed-transactions";
}

/// Batching limits
pub mod batching {
    /// Transactions per classifier call
    pub const ENRICHMENT_BATCH_SIZE: usize = 50;
    /// Texts per embedding call
    pub const EMBEDDING_BATCH_SIZE: usize = 50;
    /// Upper bound for a single bulk write
    pub const MAX_BULK_WRITE: usize = 1000;
}

/// Scheduler admission control defaults
pub mod scheduling {
    /// Lower than embedding to keep classifier spend in check
    pub const ENRICHMENT_CONCURRENCY_LIMIT: usize = 2;
    pub const EMBEDDING_CONCURRENCY_LIMIT: usize = 3;
    pub const ENRICHMENT_MAX_DURATION_SECS: u64 = 300;
    pub const EMBEDDING_MAX_DURATION_SECS: u64 = 180;
}

/// Model provider defaults
pub mod providers {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_CLASSIFIER_MODEL: &str = "gemini-2.5-flash-lite";
    pub const DEFAULT_CLASSIFIER_TEMPERATURE: f32 = 0.1;
    pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
    pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
    pub const API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";
}
