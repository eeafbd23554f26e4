//! # Structured Logging Module
//!
//! Environment-aware structured logging. Console output always, JSON file
//! output when a log directory is configured.

use crate::config::LoggingConfig;
use chrono::Utc;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging(config: &LoggingConfig, environment: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let directive = resolve_filter(config, environment);

        let console = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        let (file_layer, guard) = match &config.log_dir {
            Some(log_dir) => {
                let log_filename = format!(
                    "{}.{}.{}.log",
                    environment,
                    process::id(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                );
                let appender = tracing_appender::rolling::never(log_dir, log_filename);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(&directive))
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        // A host process may already own the global subscriber
        if tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized, keeping it");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            filter = %directive,
            file_output = config.log_dir.is_some(),
            "Structured logging initialized"
        );

        // The file writer stops flushing once its guard drops
        if let Some(guard) = guard {
            std::mem::forget(guard);
        }
    });
}

fn resolve_filter(config: &LoggingConfig, environment: &str) -> String {
    config
        .level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| get_log_level(environment).to_string())
}

/// Default level per environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
