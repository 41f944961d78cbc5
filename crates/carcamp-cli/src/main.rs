use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "carcamp")]
#[command(about = "Build and inspect the driving-distance graph between spots.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute missing distances from one spot to its nearby spots
    Build {
        /// Id of the origin spot
        #[arg(value_name = "SPOT_ID")]
        spot_id: String,

        /// Output the build report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build distances for every stored spot
    Rebuild {
        /// Spots built at the same time (overrides jobs.concurrency)
        #[arg(long, short)]
        concurrency: Option<usize>,

        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish every stored spot to the Mapbox dataset
    SyncCatalog,

    /// Import spots from a JSON file, then build their distances
    Import {
        /// JSON array of spots
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Do not publish imported spots to the Mapbox dataset
        #[arg(long)]
        no_publish: bool,
    },

    /// List stored distances from a spot, shortest drive first
    Nearby {
        #[arg(value_name = "SPOT_ID")]
        spot_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { spot_id, json } => commands::build::run(&spot_id, json).await,
        Commands::Rebuild { concurrency, json } => commands::rebuild::run(concurrency, json).await,
        Commands::SyncCatalog => commands::catalog::run().await,
        Commands::Import { file, no_publish } => commands::import::run(&file, no_publish).await,
        Commands::Nearby { spot_id, json } => commands::nearby::run(&spot_id, json).await,
    }
}
