use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use skinlens::cli;

#[derive(Parser)]
#[command(name = "skinlens", version, about = "Hybrid-retrieval skin coaching assistant")]
struct Cli {
    /// Path to a config file (defaults to ./skinlens.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the retrieval index from the corpus folder
    Index {
        /// Override the corpus folder from config
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Analyze a photo plus a state description
    Analyze {
        /// Image file to analyze
        #[arg(long)]
        image: PathBuf,
        /// Free-text description of the user's current state
        #[arg(long)]
        state: String,
        /// Print the raw JSON response instead of the styled report
        #[arg(long)]
        json: bool,
    },
    /// Run hybrid retrieval only, for debugging the index
    Search {
        query: String,
        /// Number of fused hits to show
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Skip the lexical side and fuse the dense list alone
        #[arg(long)]
        dense_only: bool,
    },
    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = skinlens::AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Index { data_dir } => cli::run_index(config, data_dir).await,
        Command::Analyze { image, state, json } => {
            cli::run_analyze(config, &image, &state, json).await
        }
        Command::Search {
            query,
            limit,
            dense_only,
        } => cli::run_search(config, &query, limit, dense_only).await,
        Command::Stats => cli::run_stats(config).await,
    }
}
