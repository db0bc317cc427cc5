//! Trellis CLI - knowledge-graph ingestion and analysis from the command line.
//!
//! Commands load an extractor snapshot, run it through the write pipeline or
//! the pure analyses, and print the results.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Trellis: multi-tenant code knowledge-graph engine.
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an extraction snapshot through the write pipeline
    Ingest {
        /// Snapshot JSON produced by the extractor
        snapshot: PathBuf,

        /// Branch the snapshot was extracted from
        #[arg(short, long)]
        branch: Option<String>,

        /// Branch policy YAML file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Index version tag stamped on every record (blue/green cutover)
        #[arg(long)]
        index_version: Option<String>,
    },

    /// Print dependency levels, callees first
    Topo {
        /// Snapshot JSON produced by the extractor
        snapshot: PathBuf,
    },

    /// Trace functions to the external surfaces they can reach
    Blast {
        /// Snapshot JSON produced by the extractor
        snapshot: PathBuf,

        /// Function or method name to analyze
        #[arg(short, long)]
        name: String,
    },

    /// Run the structural risk detectors
    Risks {
        /// Snapshot JSON produced by the extractor
        snapshot: PathBuf,

        /// Stop cycle search after this many distinct cycles
        #[arg(long, default_value_t = trellis::DEFAULT_MAX_CYCLES)]
        max_cycles: usize,
    },

    /// Show entity and edge counts by kind
    Stats {
        /// Snapshot JSON produced by the extractor
        snapshot: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Ingest {
            snapshot,
            branch,
            config,
            index_version,
        } => {
            cli::ingest::run(
                &snapshot,
                branch.as_deref(),
                config.as_deref(),
                index_version.as_deref(),
            )
            .await
        }
        Commands::Topo { snapshot } => cli::topo::run(&snapshot).await,
        Commands::Blast { snapshot, name } => cli::blast::run(&snapshot, &name).await,
        Commands::Risks {
            snapshot,
            max_cycles,
        } => cli::risks::run(&snapshot, max_cycles).await,
        Commands::Stats { snapshot } => cli::stats::run(&snapshot).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
