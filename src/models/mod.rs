//! # Data Model
//!
//! Row shapes read and written by the pipeline. The relational schema itself
//! lives in `migrations/`; these structs only carry the columns the pipeline
//! touches.

pub mod category;
pub mod embedding;
pub mod task;
pub mod transaction;

pub use category::{CategoryForEnrichment, CategoryType};
pub use embedding::{EmbeddingBatch, NewTransactionEmbedding};
pub use task::{EmbeddingTaskInput, EnrichmentTaskInput, EnrichmentTaskOutput};
pub use transaction::{
    Transaction, TransactionForEmbedding, TransactionForEnrichment, TransactionPatch,
};
