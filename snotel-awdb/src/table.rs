//! Flat CSV files for the catalog, the active stations and the dataset.
//!
//! Every table is written to a hidden sibling file first and renamed into
//! place, so a failed write never leaves a partial table at `path`.

use crate::error::Result;
use crate::fan_out::StationFailure;
use crate::observation::ObservationRecord;
use crate::station::CatalogRecord;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use log::info;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Column order of the observation table.
pub const OBSERVATION_COLUMNS: [&str; 10] = [
    "station_triplet",
    "station_name",
    "date",
    "lat",
    "lon",
    "swe_value",
    "change_in_swe_inch",
    "change_in_snow_depth_inch",
    "snow_depth",
    "air_temperature_observed_f",
];

pub const FAILURE_COLUMNS: [&str; 3] = ["station_triplet", "station_name", "error"];

fn temporary_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

fn write_rows_to<F>(path: &Path, write_rows: F) -> Result<()>
where
    F: FnOnce(&mut Writer<File>) -> Result<()>,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    write_rows(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_table<F>(path: &Path, write_rows: F) -> Result<()>
where
    F: FnOnce(&mut Writer<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temporary_path(path);
    let written = write_rows_to(&tmp_path, write_rows)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(Into::into));
    match written {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn value_to_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Columns of a catalog table: the first record's fields, in order.
pub fn catalog_header(records: &[CatalogRecord]) -> Vec<String> {
    records
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default()
}

/// Write catalog records. The first record's fields form the header; later
/// records contribute only those columns, empty where absent.
pub fn write_catalog(path: &Path, records: &[CatalogRecord]) -> Result<()> {
    write_catalog_with_header(path, &catalog_header(records), records)
}

/// Write catalog records under an explicit header, so a subset of a catalog
/// keeps the columns of the whole.
pub fn write_catalog_with_header(
    path: &Path,
    header: &[String],
    records: &[CatalogRecord],
) -> Result<()> {
    write_table(path, |writer| {
        if !header.is_empty() {
            writer.write_record(header)?;
        }
        for record in records {
            let row = header
                .iter()
                .map(|column| value_to_field(record.get(column)));
            writer.write_record(row)?;
        }
        Ok(())
    })?;
    info!("{} catalog records written to {}", records.len(), path.display());
    Ok(())
}

/// Read a catalog table back. Values come back as strings, blanks as null.
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, field)| {
                let value = if field.is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                };
                (column.to_string(), value)
            })
            .collect::<CatalogRecord>();
        records.push(record);
    }
    Ok(records)
}

pub fn write_observations(path: &Path, observations: &[ObservationRecord]) -> Result<()> {
    write_table(path, |writer| {
        writer.write_record(OBSERVATION_COLUMNS)?;
        for observation in observations {
            writer.serialize(observation)?;
        }
        Ok(())
    })?;
    info!(
        "{} observations written to {}",
        observations.len(),
        path.display()
    );
    Ok(())
}

pub fn read_observations(path: &Path) -> Result<Vec<ObservationRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let observations = rdr
        .deserialize::<ObservationRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(observations)
}

pub fn write_failures(path: &Path, failures: &[StationFailure]) -> Result<()> {
    write_table(path, |writer| {
        writer.write_record(FAILURE_COLUMNS)?;
        for failure in failures {
            writer.serialize(failure)?;
        }
        Ok(())
    })
}
