//! # Enrichment Worker
//!
//! Runs the `enrich-transactions` and `embed-transactions` tasks for one
//! payload, the way the scheduler would, and prints the task output as JSON.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use transaction_enrichment::config::ConfigManager;
use transaction_enrichment::database::{DatabaseConnection, PgTransactionStore};
use transaction_enrichment::events::TracingObserver;
use transaction_enrichment::logging::init_structured_logging;
use transaction_enrichment::models::EnrichmentTaskInput;
use transaction_enrichment::orchestration::PipelineTasks;
use transaction_enrichment::providers::GeminiClient;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "enrichment-worker")]
#[command(about = "Enrich and embed bank transactions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Environment name (development, test, production)
    #[arg(short, long, env = "ENRICHMENT_ENV")]
    environment: Option<String>,

    /// Directory holding enrichment.yaml and its overlays
    #[arg(short, long, env = "ENRICHMENT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run enrich-transactions
    Enrich(TaskArgs),

    /// Run embed-transactions (enrichment first, best effort)
    Embed(TaskArgs),

    /// Apply database migrations
    Migrate {
        #[arg(long, default_value = "migrations")]
        directory: PathBuf,
    },

    /// Load and validate configuration, then print it with secrets masked
    ValidateConfig,
}

#[derive(Args)]
struct TaskArgs {
    /// Organization owning the transactions
    #[arg(short, long, required_unless_present = "payload")]
    organization: Option<Uuid>,

    /// Comma separated transaction ids
    #[arg(short, long, value_delimiter = ',')]
    transactions: Vec<Uuid>,

    /// Full task payload: {"transactionIds": [...], "organizationId": "..."}
    #[arg(long, conflicts_with_all = ["organization", "transactions"])]
    payload: Option<String>,
}

impl TaskArgs {
    fn into_input(self) -> anyhow::Result<EnrichmentTaskInput> {
        if let Some(payload) = self.payload {
            return serde_json::from_str(&payload).context("invalid task payload");
        }
        let Some(organization) = self.organization else {
            bail!("--organization is required without --payload");
        };
        Ok(EnrichmentTaskInput::new(organization, self.transactions))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = match cli.environment.as_deref() {
        Some(environment) => ConfigManager::load_from_directory_with_env(cli.config_dir, environment)?,
        None => ConfigManager::load_from_directory(cli.config_dir)?,
    };
    let config = manager.config();
    init_structured_logging(&config.logging, manager.environment());

    match cli.command {
        Commands::ValidateConfig => {
            println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
        }
        Commands::Migrate { directory } => {
            let connection = DatabaseConnection::connect(&config.database).await?;
            connection.run_migrations(&directory).await?;
            connection.close().await;
        }
        Commands::Enrich(args) => {
            let input = args.into_input()?;
            let (tasks, connection) = build_tasks(&manager).await?;
            let output = tasks.enrich(&input).await;
            connection.close().await;
            println!("{}", serde_json::to_string(&output?)?);
        }
        Commands::Embed(args) => {
            let input = args.into_input()?;
            let (tasks, connection) = build_tasks(&manager).await?;
            let output = tasks.embed(&input).await;
            connection.close().await;
            output?;
            println!(
                "{}",
                serde_json::json!({ "organizationId": input.organization_id, "status": "completed" })
            );
        }
    }

    Ok(())
}

/// One store and one Gemini client shared by both stages
async fn build_tasks(manager: &ConfigManager) -> anyhow::Result<(PipelineTasks, DatabaseConnection)> {
    let config = manager.config();

    let connection = DatabaseConnection::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = Arc::new(PgTransactionStore::new(connection.pool().clone()));
    let gemini = Arc::new(GeminiClient::from_config(&config.classifier, &config.embedding)?);

    let tasks = PipelineTasks::new(
        config,
        store,
        gemini.clone(),
        gemini,
        Arc::new(TracingObserver),
    );
    Ok((tasks, connection))
}
