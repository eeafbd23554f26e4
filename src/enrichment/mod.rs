//! # Enrichment Prompting
//!
//! Pure functions shared by both orchestrators: transaction text
//! composition, the classifier prompt and the output schema that constrains
//! and validates what the classifier returns.

pub mod prompt;
pub mod schema;
pub mod text;

pub use prompt::build_enrichment_prompt;
pub use schema::{EnrichmentResult, EnrichmentSchema, ValidatedOutput};
pub use text::{compose_embedding_text, compose_enrichment_text};
