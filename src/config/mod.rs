//! # Pipeline Configuration
//!
//! Layered configuration for the enrichment and embedding tasks.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults (the values the tasks were tuned with)
//! 2. `config/enrichment.yaml`
//! 3. `config/enrichment.<environment>.yaml`
//! 4. `ENRICHMENT__SECTION__KEY` environment variables
//! 5. `DATABASE_URL` and `GOOGLE_GENERATIVE_AI_API_KEY`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use transaction_enrichment::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().batching.enrichment_batch_size;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::{batching, providers, scheduling};
use crate::error::{PipelineError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/enrichment.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Database connection and pooling
    pub database: DatabaseConfig,

    /// Language-model classifier used by enrichment
    pub classifier: ClassifierConfig,

    /// Embedding provider
    pub embedding: EmbeddingConfig,

    /// Batch sizes for both stages
    pub batching: BatchingConfig,

    /// Admission control per task type
    pub scheduler: SchedulerConfig,

    /// Structured logging
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/transaction_enrichment_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_seconds: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: providers::GEMINI_BASE_URL.to_string(),
            model: providers::DEFAULT_CLASSIFIER_MODEL.to_string(),
            temperature: providers::DEFAULT_CLASSIFIER_TEMPERATURE,
            request_timeout_seconds: 120,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub request_timeout_seconds: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: providers::GEMINI_BASE_URL.to_string(),
            model: providers::DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: providers::DEFAULT_EMBEDDING_DIMENSIONS,
            request_timeout_seconds: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub enrichment_batch_size: usize,
    pub embedding_batch_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            enrichment_batch_size: batching::ENRICHMENT_BATCH_SIZE,
            embedding_batch_size: batching::EMBEDDING_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enrichment: QueueConfig,
    pub embedding: QueueConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enrichment: QueueConfig {
                concurrency_limit: scheduling::ENRICHMENT_CONCURRENCY_LIMIT,
                max_duration_seconds: scheduling::ENRICHMENT_MAX_DURATION_SECS,
            },
            embedding: QueueConfig {
                concurrency_limit: scheduling::EMBEDDING_CONCURRENCY_LIMIT,
                max_duration_seconds: scheduling::EMBEDDING_MAX_DURATION_SECS,
            },
        }
    }
}

/// Concurrency ceiling and wall-clock budget for one task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueueConfig {
    pub concurrency_limit: usize,
    pub max_duration_seconds: u64,
}

impl QueueConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_seconds)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Explicit filter directive; falls back to `RUST_LOG`, then the environment default
    pub level: Option<String>,
    /// Emit console output as JSON lines
    pub json: bool,
    /// Also write JSON logs into this directory
    pub log_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let batch_sizes = [
            ("batching.enrichment_batch_size", self.batching.enrichment_batch_size),
            ("batching.embedding_batch_size", self.batching.embedding_batch_size),
        ];
        for (field, size) in batch_sizes {
            if size == 0 || size > batching::MAX_BULK_WRITE {
                return Err(PipelineError::Configuration(format!(
                    "{field} must be between 1 and {}, got {size}",
                    batching::MAX_BULK_WRITE
                )));
            }
        }

        let queues = [
            ("scheduler.enrichment", self.scheduler.enrichment),
            ("scheduler.embedding", self.scheduler.embedding),
        ];
        for (field, queue) in queues {
            if queue.concurrency_limit == 0 {
                return Err(PipelineError::Configuration(format!(
                    "{field}.concurrency_limit must be at least 1"
                )));
            }
            if queue.max_duration_seconds == 0 {
                return Err(PipelineError::Configuration(format!(
                    "{field}.max_duration_seconds must be at least 1"
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            return Err(PipelineError::Configuration(format!(
                "classifier.temperature must be within [0, 2], got {}",
                self.classifier.temperature
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(PipelineError::Configuration(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(PipelineError::Configuration(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batching.enrichment_batch_size, 50);
        assert_eq!(config.scheduler.enrichment.concurrency_limit, 2);
        assert_eq!(config.scheduler.embedding.max_duration(), Duration::from_secs(180));
        assert_eq!(config.embedding.dimensions, 768);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = PipelineConfig::default();
        config.batching.embedding_batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_batch_size_above_bulk_ceiling_rejected() {
        let mut config = PipelineConfig::default();
        config.batching.enrichment_batch_size = batching::MAX_BULK_WRITE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = PipelineConfig::default();
        config.classifier.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = PipelineConfig::default();
        config.classifier.api_key = Some(SecretString::new("super-secret".to_string()));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: PipelineConfig = serde_json::from_value(serde_json::json!({
            "batching": { "enrichment_batch_size": 10 }
        }))
        .unwrap();
        assert_eq!(config.batching.enrichment_batch_size, 10);
        assert_eq!(config.batching.embedding_batch_size, 50);
    }
}
