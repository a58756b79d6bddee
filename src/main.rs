//! # Mailfeed daemon (`mailfeedd`)
//!
//! The `mailfeedd` binary runs the email-to-RSS service and offers a couple
//! of operational commands around it.
//!
//! ## Usage
//!
//! ```bash
//! mailfeedd --config ./config/mailfeed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mailfeedd serve` | Run the HTTP server (ingestion + feed delivery) |
//! | `mailfeedd ingest <feed> <file>` | Ingest a raw message from a file |
//! | `mailfeedd refresh <feed>` | Regenerate a feed document from its records |
//!
//! ## Examples
//!
//! ```bash
//! # Run the service
//! mailfeedd serve --config ./config/mailfeed.toml
//!
//! # Backfill one message that the forwarder missed
//! mailfeedd ingest journalclub ./saved-message.eml --overwrite
//!
//! # Force a feed rebuild after editing templates
//! mailfeedd refresh journalclub
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mailfeed::config::load_config;
use mailfeed::pipeline::Pipeline;
use mailfeed::server;

/// Mailfeed — an email-to-RSS ingestion and feed synthesis service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mailfeed.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mailfeedd",
    about = "Mailfeed — an email-to-RSS ingestion and feed synthesis service",
    version,
    long_about = "Mailfeed ingests RFC-5322 email messages POSTed by a mail forwarder, \
    extracts one typed item per message via a per-feed strategy, persists items as JSON \
    records in object storage, and synthesizes an RSS document that feed readers GET back."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mailfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    ///
    /// Binds to `server.bind` from the configuration and serves ingestion
    /// (POST) and feed delivery (GET) until terminated.
    Serve,

    /// Ingest a raw RFC-5322 message from a file.
    ///
    /// The operational backfill path: feeds a saved message through the
    /// same pipeline the forwarder uses, then republishes the feed.
    Ingest {
        /// Feed to ingest into.
        feed: String,

        /// Path to the raw message file.
        file: PathBuf,

        /// Replace an existing item with the same timestamp.
        #[arg(long)]
        overwrite: bool,
    },

    /// Regenerate a feed document from its stored item records.
    Refresh {
        /// Feed to regenerate.
        feed: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let pipeline = Pipeline::from_config(&config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&config.server.bind, Arc::new(pipeline)).await?;
        }
        Commands::Ingest {
            feed,
            file,
            overwrite,
        } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("read message file {}", file.display()))?;
            let item = pipeline.ingest(&feed, &raw, overwrite).await?;
            println!("ingested {}/{}", feed, item.key());
        }
        Commands::Refresh { feed } => {
            pipeline.regenerate(&feed).await?;
            println!("refreshed {feed}");
        }
    }

    Ok(())
}
