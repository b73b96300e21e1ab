//! # Docshelf CLI (`shelf`)
//!
//! The `shelf` binary is the primary interface for Docshelf. It provides
//! commands for database initialization, document ingestion, browsing,
//! and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the SQLite database and run schema migrations |
//! | `shelf ingest <folder> <filename> <pdf>` | Ingest one PDF document |
//! | `shelf list` | Print every folder and its filenames |
//! | `shelf read <folder> <filename>` | Print one variant of a document |
//! | `shelf serve` | Start the HTTP server and browsing UI |

mod blob;
mod config;
mod db;
mod error;
mod extract;
mod get;
mod ingest;
mod list;
mod migrate;
mod models;
mod server;
mod summarize;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::models::Variant;

/// Docshelf CLI — a self-hosted PDF library with model-generated summary
/// variants.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Docshelf — a self-hosted PDF library with model-generated summary variants",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the `files` table, and the
    /// unique index on `(folder, filename)`. This command is idempotent —
    /// running it multiple times is safe.
    Init,

    /// Ingest one PDF document.
    ///
    /// Runs the full pipeline: extraction, summarization through the
    /// configured provider, blob persistence, and metadata persistence.
    Ingest {
        /// Grouping label the document is filed under.
        folder: String,

        /// Filename, unique within the folder.
        filename: String,

        /// Path to the PDF file to ingest.
        file: PathBuf,
    },

    /// Print every folder and its filenames.
    List,

    /// Print one variant of a document.
    Read {
        /// The document's folder.
        folder: String,

        /// The document's filename.
        filename: String,

        /// Which variant to print: `full`, `half`, `small`, or `bullets`.
        #[arg(long, default_value = "full")]
        variant: String,
    },

    /// Start the HTTP server and browsing UI.
    ///
    /// Binds to the address configured in `[server].bind`. Run
    /// `shelf init` first.
    Serve,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.db.path).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            folder,
            filename,
            file,
        } => {
            let bytes = std::fs::read(&file).map_err(|e| {
                anyhow::anyhow!("Failed to read document {}: {}", file.display(), e)
            })?;
            let pool = db::connect(&cfg.db.path).await?;
            let blobs = blob::create_blob_store(&cfg.blobs)?;
            let summarizer = summarize::create_summarizer(&cfg.summarizer)?;

            let confirmation = ingest::ingest_document(
                &pool,
                blobs.as_ref(),
                summarizer.as_ref(),
                cfg.ingest.replaces_duplicates(),
                &folder,
                &filename,
                &bytes,
            )
            .await?;
            pool.close().await;

            println!(
                "Stored {} in folder {}",
                confirmation.filename, confirmation.folder
            );
        }
        Commands::List => {
            let pool = db::connect(&cfg.db.path).await?;
            list::run_list(&pool).await?;
            pool.close().await;
        }
        Commands::Read {
            folder,
            filename,
            variant,
        } => {
            let variant = Variant::from_name(&variant).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown variant: '{}'. Must be full, half, small, or bullets.",
                    variant
                )
            })?;
            let pool = db::connect(&cfg.db.path).await?;
            get::run_read(&pool, &folder, &filename, variant).await?;
            pool.close().await;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
