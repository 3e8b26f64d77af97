//! Command handlers backed by the live AWDB services.

use crate::config::PipelineConfig;
use crate::pipeline::{load_active_stations, load_catalog, run_pipeline};
use anyhow::Context;
use log::info;
use snotel_awdb::client::AwdbClient;

fn client(config: &PipelineConfig) -> anyhow::Result<AwdbClient> {
    AwdbClient::new(config.endpoints.clone(), config.timeout).context("building HTTP client")
}

/// Fetch the station catalog into the output directory.
pub async fn run_catalog(config: &PipelineConfig) -> anyhow::Result<()> {
    let records = load_catalog(config, &client(config)?).await?;
    info!(
        "Catalog complete. {} stations in {}",
        records.len(),
        config.catalog_path().display()
    );
    Ok(())
}

/// Produce the active-station table and print one line per station.
pub async fn run_stations(config: &PipelineConfig) -> anyhow::Result<()> {
    let stations = load_active_stations(config, &client(config)?).await?;
    for station in &stations {
        println!(
            "{}\t{}\t{}\t{}",
            station.station_triplet,
            station.name,
            station.latitude.map_or(String::new(), |v| format!("{v:.5}")),
            station.longitude.map_or(String::new(), |v| format!("{v:.5}")),
        );
    }
    info!(
        "{} active stations in {}",
        stations.len(),
        config.active_stations_path().display()
    );
    Ok(())
}

/// Run the full catalog -> filter -> observations pipeline.
pub async fn run_query(config: &PipelineConfig) -> anyhow::Result<()> {
    info!(
        "Querying daily observations from {} to {}",
        config.start_date, config.end_date
    );
    let summary = run_pipeline(config, &client(config)?).await?;
    if summary.skipped {
        info!(
            "Query skipped, {} already exists",
            summary.observations_path.display()
        );
    } else {
        info!(
            "Query complete. {} observations from {} stations ({} failed) written to {}",
            summary.observations,
            summary.stations,
            summary.failures,
            summary.observations_path.display()
        );
    }
    Ok(())
}
