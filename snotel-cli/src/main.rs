//! SNOTEL CLI - Command line tool for fetching daily snow station data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "snotel-cli",
    version,
    about = "SNOTEL daily snow station data toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: snotel_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    snotel_cmd::run(cli.command).await
}
