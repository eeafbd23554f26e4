//! # Pipeline Errors
//!
//! Structured error handling for the enrichment and embedding pipeline.
//!
//! Every failure the pipeline can surface maps onto one [`ErrorCategory`], which
//! is what the external scheduler looks at when deciding whether a failed task
//! is worth retrying.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Embeddings count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("Invalid classifier output: {0}")]
    InvalidClassifierOutput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Task {task} exceeded its wall-clock budget of {budget:?}")]
    TaskTimeout { task: String, budget: Duration },

    #[error("Concurrency error: {0}")]
    Concurrency(String),
}

/// Error taxonomy used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Provider, network or database hiccup. Retryable at scheduler level.
    Transient,
    /// A result could not be paired with its transaction. Never downgraded.
    DataIntegrity,
    /// Classifier output did not have the expected shape.
    ResultShape,
    /// Bad input to a write or a task.
    Validation,
    /// Misconfiguration; needs an operator.
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::DataIntegrity => write!(f, "data_integrity"),
            ErrorCategory::ResultShape => write!(f, "result_shape"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

impl PipelineError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Database(_)
            | PipelineError::Provider { .. }
            | PipelineError::TaskTimeout { .. }
            | PipelineError::Concurrency(_) => ErrorCategory::Transient,
            PipelineError::EmbeddingCountMismatch { .. } => ErrorCategory::DataIntegrity,
            PipelineError::InvalidClassifierOutput(_) | PipelineError::Serialization(_) => {
                ErrorCategory::ResultShape
            }
            PipelineError::Validation(_) => ErrorCategory::Validation,
            PipelineError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether a scheduler-level retry can be expected to help.
    ///
    /// Result-shape failures are retryable because classifier output is
    /// non-deterministic; a retry run only sees still-pending rows anyway.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::ResultShape
        )
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PipelineError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        PipelineError::Database(format!("migration failed: {err}"))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::provider("http", err.to_string())
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
