//! Catalog -> active stations -> observations, one CSV per stage.
//!
//! A stage whose file already exists is read back (or skipped) rather than
//! regenerated, so re-running against the same output directory makes no
//! network calls for finished stages.

use crate::config::PipelineConfig;
use anyhow::Context;
use log::info;
use snotel_awdb::{
    client::AwdbSource,
    fan_out::fetch_all,
    station::{fetch_catalog, CatalogRecord, Station},
    table::{
        catalog_header, read_catalog, write_catalog, write_catalog_with_header, write_failures,
        write_observations,
    },
};
use std::path::PathBuf;

#[derive(Debug, PartialEq, Clone)]
pub struct PipelineSummary {
    pub observations_path: PathBuf,
    /// True when the observations file already existed and nothing ran.
    pub skipped: bool,
    pub stations: usize,
    pub observations: usize,
    pub failures: usize,
}

/// Full station catalog: read from disk if present, else fetched and saved.
pub async fn load_catalog<S: AwdbSource>(
    config: &PipelineConfig,
    source: &S,
) -> anyhow::Result<Vec<CatalogRecord>> {
    let path = config.catalog_path();
    if path.exists() {
        info!("{} exists, reusing catalog", path.display());
        return read_catalog(&path).with_context(|| format!("reading {}", path.display()));
    }
    let records = fetch_catalog(source)
        .await
        .context("fetching station catalog")?;
    write_catalog(&path, &records).with_context(|| format!("writing {}", path.display()))?;
    Ok(records)
}

/// Active stations inside the bounding box, read from disk if present.
pub async fn load_active_stations<S: AwdbSource>(
    config: &PipelineConfig,
    source: &S,
) -> anyhow::Result<Vec<Station>> {
    let path = config.active_stations_path();
    if path.exists() {
        info!("{} exists, reusing active stations", path.display());
        let records =
            read_catalog(&path).with_context(|| format!("reading {}", path.display()))?;
        return Ok(Station::from_catalog(&records));
    }
    let catalog = load_catalog(config, source).await?;
    let stations = Station::from_catalog(&catalog);
    let active = config.filter.apply(&stations);
    info!(
        "{} of {} stations are active inside {:?}",
        active.len(),
        stations.len(),
        config.filter.bounding_box
    );
    let records = active
        .iter()
        .map(|station| station.record.clone())
        .collect::<Vec<CatalogRecord>>();
    write_catalog_with_header(&path, &catalog_header(&catalog), &records)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(active)
}

/// Run every stage that has no output yet.
pub async fn run_pipeline<S: AwdbSource>(
    config: &PipelineConfig,
    source: &S,
) -> anyhow::Result<PipelineSummary> {
    let observations_path = config.observations_path();
    if observations_path.exists() {
        info!(
            "{} exists, nothing to fetch",
            observations_path.display()
        );
        return Ok(PipelineSummary {
            observations_path,
            skipped: true,
            stations: 0,
            observations: 0,
            failures: 0,
        });
    }

    let stations = load_active_stations(config, source).await?;
    let outcome = fetch_all(
        source,
        &stations,
        &config.start_date,
        &config.end_date,
        &config.fan_out,
    )
    .await
    .context("fetching station observations")?;

    // The observations file marks the run as done, so it goes last.
    if !outcome.failures.is_empty() {
        let failures_path = config.failures_path();
        write_failures(&failures_path, &outcome.failures)
            .with_context(|| format!("writing {}", failures_path.display()))?;
        info!(
            "{} stations failed, listed in {}",
            outcome.failures.len(),
            failures_path.display()
        );
    }
    write_observations(&observations_path, &outcome.observations)
        .with_context(|| format!("writing {}", observations_path.display()))?;

    Ok(PipelineSummary {
        observations_path,
        skipped: false,
        stations: stations.len(),
        observations: outcome.observations.len(),
        failures: outcome.failures.len(),
    })
}
