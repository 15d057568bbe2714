#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod pipeline;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use command::{
    BootstrapInput, BootstrapStrategy, CommandStrategy, InitStrategy, ProcessInput,
    ProcessStrategy, ReconcileStrategy, ReflectInput, ReflectStrategy, VersionStrategy,
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use termin_calendar::{CalendarSink, HttpCalendarClient};
use termin_cascade::{Extractor, HttpLlmProvider};
use termin_config::Config;
use termin_context::ContextAssembler;
use termin_core::{LlmProvider, MemoryBackend, MemoryContext, MemoryHealth};
use termin_memory_client::{MemoryClient, MemoryClientConfig};
use termin_person::PersonStore;
use termin_reflection::ReflectionAgent;
use termin_store::AppointmentStore;
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "terminctl")]
#[command(about = "context-aware appointment extraction core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a single message (debug entrypoint).
    Process {
        /// Chat the message belongs to.
        #[arg(short, long)]
        chat_id: String,
        /// Message sender.
        #[arg(short, long)]
        sender: String,
        /// Message text.
        #[arg(short, long)]
        text: String,
        /// Override the generated message id.
        #[arg(long)]
        message_id: Option<String>,
    },
    /// Seed memory from a plain-text chat export.
    Bootstrap {
        /// Path to the chat export file.
        #[arg(short, long)]
        file: std::path::PathBuf,
        /// Chat id the export belongs to.
        #[arg(short, long)]
        chat_id: String,
    },
    /// Reconcile appointment state with the remote calendar.
    Reconcile,
    /// Run a reflection cycle, once or on a fixed interval.
    Reflect {
        /// Keep running, ticking every `reflection.interval_min`.
        #[arg(short, long)]
        r#loop: bool,
    },
    /// Initialize configuration.
    Init,
    /// Show version.
    Version,
}

/// `MemoryBackend` used when `config.memory.enabled` is `false`: every call
/// is a no-op, never touching the network.
struct NoopMemory;

#[async_trait::async_trait]
impl MemoryBackend for NoopMemory {
    fn memorize(&self, _chat_id: &str, _sender: &str, _text: &str, _timestamp: DateTime<Utc>) {}

    async fn recall(&self, _query: &str, _chat_id: &str, _top_k: usize) -> MemoryContext {
        MemoryContext::empty()
    }

    async fn health(&self) -> MemoryHealth {
        MemoryHealth {
            connected: false,
            latency_ms: None,
        }
    }
}

/// Connect to the configured SQLite database and ensure the three tables
/// this core owns or reads exist, using a connect-then-create-table-if-missing
/// startup sequence.
async fn connect_and_migrate(config: &Config) -> anyhow::Result<DatabaseConnection> {
    info!(url = %config.database.url, "connecting to database");
    let db = Database::connect(&config.database.url).await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    for stmt in [
        backend.build(&schema.create_table_from_entity(termin_entities::MessageEntity)),
        backend.build(&schema.create_table_from_entity(termin_entities::AppointmentEntity)),
        backend.build(&schema.create_table_from_entity(termin_entities::FeedbackEntity)),
    ] {
        match db.execute(stmt).await {
            Ok(_) => {}
            Err(err) if is_table_already_exists_error(&err) => {
                info!("table already exists, skipping creation");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(db)
}

fn is_table_already_exists_error(err: &sea_orm::DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

fn build_memory(config: &Config) -> Arc<dyn MemoryBackend> {
    if config.memory.enabled {
        Arc::new(MemoryClient::new(MemoryClientConfig::from_url(
            config.memory.url.clone(),
            config.memory.recall_timeout_s,
        )))
    } else {
        Arc::new(NoopMemory)
    }
}

fn build_calendar(
    config: &Config,
    store: Arc<AppointmentStore>,
) -> anyhow::Result<Arc<CalendarSink>> {
    let client = Arc::new(HttpCalendarClient::new(
        config.calendars.base_url.clone(),
        config.calendars.confirmed_name.clone(),
        config.calendars.suggested_name.clone(),
    ));
    Ok(Arc::new(CalendarSink::new(client, store, &config.timezone)))
}

/// Build every collaborator the pipeline needs and tie them together. Used
/// by every subcommand except `init`/`version`/`bootstrap`, which don't
/// need the full pipeline wired up.
async fn build_pipeline(config: Config) -> anyhow::Result<Pipeline> {
    let db = connect_and_migrate(&config).await?;
    let persons = Arc::new(Mutex::new(PersonStore::load(&config.profiles_dir)?));
    let memory = build_memory(&config);
    let store = Arc::new(AppointmentStore::new(db.clone()));
    let calendar = build_calendar(&config, store.clone())?;
    let assembler = ContextAssembler::new(db.clone(), persons.clone(), memory.clone(), &config)?;
    let extractor = Extractor::new(&config)?;

    Ok(Pipeline {
        db,
        config,
        persons,
        memory,
        store,
        calendar,
        assembler,
        extractor,
    })
}

fn build_reflection_provider(config: &Config) -> Option<Arc<dyn LlmProvider>> {
    config.providers.reflection.as_ref().map(|provider_config| {
        Arc::new(HttpLlmProvider::new("reflection", provider_config)) as Arc<dyn LlmProvider>
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            InitStrategy.execute(()).await?;
        }
        Commands::Version => {
            VersionStrategy.execute(()).await?;
        }
        Commands::Process {
            chat_id,
            sender,
            text,
            message_id,
        } => {
            let config = Config::load()?;
            let pipeline = build_pipeline(config).await?;
            let strategy = ProcessStrategy { pipeline };
            strategy
                .execute(ProcessInput {
                    chat_id,
                    sender,
                    text,
                    message_id,
                    reply_to: None,
                })
                .await?;
        }
        Commands::Bootstrap { file, chat_id } => {
            let config = Config::load()?;
            let memory = build_memory(&config);
            let strategy = BootstrapStrategy { memory };
            strategy.execute(BootstrapInput { file, chat_id }).await?;
        }
        Commands::Reconcile => {
            let config = Config::load()?;
            let pipeline = build_pipeline(config).await?;
            let strategy = ReconcileStrategy {
                store: pipeline.store,
                calendar: pipeline.calendar,
                persons: pipeline.persons,
            };
            strategy.execute(()).await?;
        }
        Commands::Reflect { r#loop: run_loop } => {
            let config = Config::load()?;
            let db = connect_and_migrate(&config).await?;
            let persons = Arc::new(Mutex::new(PersonStore::load(&config.profiles_dir)?));
            let provider = build_reflection_provider(&config);
            let interval_min = config.reflection.interval_min;
            let agent = ReflectionAgent::new(db, persons, provider, &config);
            let strategy = ReflectStrategy {
                agent,
                interval_min,
            };
            strategy.execute(ReflectInput { run_loop }).await?;
        }
    }

    Ok(())
}
