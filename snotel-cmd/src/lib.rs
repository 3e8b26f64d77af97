//! Command implementations for the SNOTEL CLI.
//!
//! Provides subcommands for fetching the AWDB station catalog, narrowing it
//! to active stations, and querying daily snow observations.

use clap::Subcommand;
use config::{PipelineArgs, PipelineConfig};

pub mod config;
pub mod pipeline;
pub mod query;

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the full station catalog
    Catalog {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// List active stations inside the bounding box
    Stations {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// Fetch daily SWE, snow depth and temperature for every active station
    Query {
        #[command(flatten)]
        args: PipelineArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Catalog { args } => query::run_catalog(&PipelineConfig::try_from(args)?).await,
        Command::Stations { args } => query::run_stations(&PipelineConfig::try_from(args)?).await,
        Command::Query { args } => query::run_query(&PipelineConfig::try_from(args)?).await,
    }
}
