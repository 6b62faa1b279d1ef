//! # Docpile CLI (`docpile`)
//!
//! ## Usage
//!
//! ```bash
//! docpile --config ./config/docpile.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docpile serve` | Start the HTTP server for the frontend |
//! | `docpile check` | Validate the configuration and load both corpora |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docpile::{config, corpus, library, server};

/// Docpile — model-task backend for a document reading and sense-making
/// frontend.
#[derive(Parser)]
#[command(
    name = "docpile",
    about = "Model-task backend for a document reading and sense-making frontend",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docpile.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Loads both embedding corpora, then binds to the address configured
    /// in `[server].bind` and serves until terminated.
    Serve,

    /// Validate the configuration.
    ///
    /// Loads both embedding corpora and scans the document library, then
    /// prints what it found. Fails with the same errors `serve` would.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docpile=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Check => {
            let corpora = corpus::CorpusStore::load(&cfg.corpus)?;
            let files = library::scan_library(&cfg.library.root)?;
            println!(
                "ok: {} node embeddings, {} document embeddings, {} library files",
                corpora.nodes.len(),
                corpora.documents.len(),
                files.len()
            );
        }
    }

    Ok(())
}
