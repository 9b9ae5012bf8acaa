//! # Case-Law Harness CLI (`clh`)
//!
//! The `clh` binary is the primary interface for the harness. It provides
//! commands for listing configured court portals and for running the
//! harvest loop against one of them.
//!
//! ## Usage
//!
//! ```bash
//! clh --config ./config/clh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clh sources` | List configured portals and probe their health |
//! | `clh harvest <portal>` | Scrape the portal's case list into records + downloads |
//!
//! ## Examples
//!
//! ```bash
//! # Start Chrome with remote debugging first
//! chrome --remote-debugging-port=9222 &
//!
//! # Check the portal answers
//! clh sources
//!
//! # Harvest everything currently listed
//! clh harvest shc
//!
//! # First five rows, records to a scratch file
//! clh harvest shc --limit 5 --out /tmp/records.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use caselaw_harness::config;
use caselaw_harness::harvest::{self, HarvestOptions};
use caselaw_harness::progress::ProgressMode;
use caselaw_harness::sources;

/// Case-Law Harness — a browser-driven harvester for published court
/// judgments.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/clh.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "clh",
    about = "Case-Law Harness — a browser-driven harvester for published court judgments",
    version,
    long_about = "Case-Law Harness drives a Chrome browser over the DevTools Protocol to walk a \
    court portal's case list, extract per-case metadata, download judgment documents, and append \
    records to a persisted JSON result set. Bad rows are logged and skipped, never fatal."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/clh.toml`. Connectivity, browser, output, and
    /// portal settings are read from this file.
    #[arg(long, global = true, default_value = "./config/clh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List configured portals and probe their health.
    ///
    /// Issues a plain HTTP GET against each portal's list URL. Useful for
    /// verifying configuration before running a harvest.
    Sources,

    /// Harvest a portal's case list.
    ///
    /// Requires a Chrome instance running with `--remote-debugging-port`.
    /// Walks every case row, extracts metadata, downloads the judgment
    /// document, and appends one record per case to the output JSON file.
    Harvest {
        /// Portal name as configured (e.g. `shc`).
        portal: String,

        /// Process at most N rows.
        #[arg(long)]
        limit: Option<usize>,

        /// Count rows only — no clicks, downloads, or record writes.
        #[arg(long)]
        dry_run: bool,

        /// Override the records file path from config.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Progress reporting on stderr: off, human, or json.
        /// Defaults to human when stderr is a TTY, otherwise off.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg).await?;
        }
        Commands::Harvest {
            portal,
            limit,
            dry_run,
            out,
            progress,
        } => {
            let opts = HarvestOptions {
                limit,
                dry_run,
                out,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            harvest::run_harvest(&cfg, &portal, &opts).await?;
        }
    }

    Ok(())
}
