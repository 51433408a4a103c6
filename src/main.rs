//! # Graphdex CLI
//!
//! Keeps a knowledge-graph index over a documentation corpus fresh and
//! answers questions against it.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `graphdex init` | Create the project layout and settings file |
//! | `graphdex build` | Sync the corpus, convert documents, build the index |
//! | `graphdex query "<text>"` | Ask a question (`--mode local` or `global`) |
//! | `graphdex ingest <file>` | Add one document and run an incremental update |
//! | `graphdex serve` | Start the HTTP API with a background startup build |
//!
//! ## Examples
//!
//! ```bash
//! graphdex --config ./graphdex.toml build --force
//! graphdex --config ./graphdex.toml query "how do provider accounts work?" --mode global
//! graphdex --config ./graphdex.toml serve
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use graphdex::chat::ChatClient;
use graphdex::coordinator::{self, BuildOutcome};
use graphdex::project::Project;
use graphdex::query::SearchMode;
use graphdex::{config, delivery, engine, ingest, query, server};

/// Graphdex: index freshness and query orchestration for a documentation
/// knowledge graph.
#[derive(Parser)]
#[command(
    name = "graphdex",
    about = "Knowledge-graph index orchestrator for documentation Q&A",
    version
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(long, global = true, default_value = "./graphdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project directory layout and settings file.
    ///
    /// Idempotent: an existing settings file is left untouched.
    Init,

    /// Sync the corpus, convert documents, and build the index.
    ///
    /// Skips the engine invocation when a complete artifact set already
    /// exists, unless forced.
    Build {
        /// Rebuild even when a complete artifact set exists.
        #[arg(long)]
        force: bool,
    },

    /// Ask a question against the built index.
    Query {
        /// The question text.
        text: String,

        /// Retrieval strategy: `global` (corpus-wide synthesis) or
        /// `local` (entity-focused).
        #[arg(long, default_value = "global")]
        mode: String,
    },

    /// Add one document to the index via an incremental update.
    Ingest {
        /// Path of the document to ingest.
        file: PathBuf,

        /// Name to store the document under; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Start the HTTP API and a background startup build.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let project = Project::new(cfg.project.work_dir.clone());

    match cli.command {
        Commands::Init => {
            let fresh = project.ensure_initialized(&cfg)?;
            if fresh {
                println!("Project initialized at {}", project.root().display());
            } else {
                println!("Project already initialized at {}", project.root().display());
            }
        }
        Commands::Build { force } => {
            let engine = engine::create_engine(&cfg.engine)?;
            let outcome =
                coordinator::build(&cfg, &project, engine.as_ref(), force || cfg.build.force)
                    .await?;
            match outcome {
                BuildOutcome::Skipped => println!("Index already built, nothing to do."),
                BuildOutcome::Built { stages } => {
                    println!("Index built successfully ({stages} stages).")
                }
            }
        }
        Commands::Query { text, mode } => {
            let mode: SearchMode = mode.parse()?;
            let engine = engine::create_engine(&cfg.engine)?;
            let response = query::run_query(&cfg, &project, engine.as_ref(), &text, mode).await?;

            let mut answer = response.answer;
            if cfg.chat.is_enabled() {
                let chat = ChatClient::new(&cfg.chat)?;
                match delivery::summarize_if_long(&chat, &answer, cfg.delivery.summary_budget)
                    .await
                {
                    Ok(Some(summary)) => answer = summary,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "summarization unavailable, printing full answer")
                    }
                }
            }

            // Deliver in transport-sized pieces, in order.
            for chunk in delivery::chunk_for_transport(&answer, cfg.delivery.chunk_size) {
                println!("{chunk}");
            }
        }
        Commands::Ingest { file, name } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = name.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "upload.txt".to_string())
            });

            let engine = engine::create_engine(&cfg.engine)?;
            let stages =
                ingest::ingest_document(&project, engine.as_ref(), &file_name, &content).await?;
            println!("Document ingested; update ran {} stages.", stages.len());
        }
        Commands::Serve => {
            let engine: Arc<dyn engine::IndexEngine> =
                Arc::from(engine::create_engine(&cfg.engine)?);
            server::run_server(cfg, project, engine).await?;
        }
    }

    Ok(())
}
