#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Transaction Enrichment
//!
//! Two-stage background pipeline for bank transactions of a personal
//! finance dashboard.
//!
//! ## Overview
//!
//! - **Enrichment** sends pending transactions to a language-model
//!   classifier in batches and stores a cleaned merchant name and, for
//!   uncategorized expenses, a category from the organization's whitelist.
//!   Every transaction of a processed batch ends with
//!   `enrichment_completed = true`, whatever the classifier did.
//! - **Embedding** waits for enrichment (best effort), then stores one
//!   vector per transaction for semantic search, strictly aligned with the
//!   text it was computed from.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Both stages, the batch processor and task queues
//! - [`enrichment`] - Text composition, prompt and output schema
//! - [`providers`] - Classifier and embedding ports, Gemini client
//! - [`database`] - Persistence gateway (Postgres and in-memory)
//! - [`models`] - Rows and task payloads
//! - [`events`] - Observability port
//! - [`config`] - Layered configuration
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transaction_enrichment::config::ConfigManager;
//! use transaction_enrichment::database::{DatabaseConnection, PgTransactionStore};
//! use transaction_enrichment::events::TracingObserver;
//! use transaction_enrichment::models::EnrichmentTaskInput;
//! use transaction_enrichment::orchestration::PipelineTasks;
//! use transaction_enrichment::providers::GeminiClient;
//!
//! # async fn example(input: EnrichmentTaskInput) -> transaction_enrichment::Result<()> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let connection = DatabaseConnection::connect(&config.database).await?;
//! let store = Arc::new(PgTransactionStore::new(connection.pool().clone()));
//! let gemini = Arc::new(GeminiClient::from_config(&config.classifier, &config.embedding)?);
//!
//! let tasks = PipelineTasks::new(config, store, gemini.clone(), gemini, Arc::new(TracingObserver));
//! let output = tasks.enrich(&input).await?;
//! println!("enriched {}", output.enriched_count);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod providers;
pub mod validation;

pub use crate::config::{ConfigManager, PipelineConfig};
pub use database::{InMemoryTransactionStore, PgTransactionStore, TransactionStore};
pub use error::{ErrorCategory, PipelineError, Result};
pub use events::{PipelineEvent, PipelineObserver, RecordingObserver, TracingObserver};
pub use models::{
    EmbeddingTaskInput, EnrichmentTaskInput, EnrichmentTaskOutput, Transaction, TransactionPatch,
};
pub use orchestration::{EmbeddingOrchestrator, EnrichmentOrchestrator, PipelineTasks};
pub use providers::{Classifier, EmbeddingProvider, GeminiClient};
