use crate::client::AwdbSource;
use crate::error::Result;
use crate::report::{parse_report, ReportRow};
use crate::station::Station;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use snotel_utils::dates::DATE_FORMAT;

pub const DATE_COLUMN: &str = "Date";
pub const SWE_COLUMN: &str = "Snow Water Equivalent (in) Start of Day Values";
pub const SWE_DELTA_COLUMN: &str = "Change In Snow Water Equivalent (in)";
pub const SNOW_DEPTH_COLUMN: &str = "Snow Depth (in) Start of Day Values";
pub const SNOW_DEPTH_DELTA_COLUMN: &str = "Change In Snow Depth (in)";
pub const AIR_TEMPERATURE_COLUMN: &str = "Air Temperature Observed (degF) Start of Day Values";

/// Element codes requested from the report generator, in column order.
pub const ELEMENT_CODES: [&str; 5] = [
    "WTEQ::value",
    "WTEQ::delta",
    "SNWD::value",
    "SNWD::delta",
    "TOBS::value",
];

/// A single daily observation from a SNOTEL station.
///
/// The two "change in" columns of the report are kept apart:
/// `change_in_swe_inch` carries the SWE delta and `change_in_snow_depth_inch`
/// the snow-depth delta.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub station_triplet: String,
    pub station_name: String,
    pub date: Option<NaiveDate>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub swe_value: Option<f64>,
    pub change_in_swe_inch: Option<f64>,
    pub change_in_snow_depth_inch: Option<f64>,
    pub snow_depth: Option<f64>,
    pub air_temperature_observed_f: Option<f64>,
}

/// Tolerant column lookup. An exact header match wins; otherwise a header
/// ending in the column name matches, which covers reports that prefix each
/// column with the station name.
fn row_value<'a>(row: &'a ReportRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .or_else(|| {
            row.iter()
                .find(|(header, _)| header.ends_with(column))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn row_f64(row: &ReportRow, column: &str) -> Option<f64> {
    row_value(row, column).and_then(|value| value.parse::<f64>().ok())
}

impl ObservationRecord {
    /// Map one report row. Location comes from the station, never the report.
    /// Absent or unreadable values become `None`.
    pub fn from_row(station: &Station, row: &ReportRow) -> ObservationRecord {
        ObservationRecord {
            station_triplet: station.station_triplet.clone(),
            station_name: station.name.clone(),
            date: row_value(row, DATE_COLUMN)
                .and_then(|value| NaiveDate::parse_from_str(value, DATE_FORMAT).ok()),
            lat: station.latitude,
            lon: station.longitude,
            swe_value: row_f64(row, SWE_COLUMN),
            change_in_swe_inch: row_f64(row, SWE_DELTA_COLUMN),
            change_in_snow_depth_inch: row_f64(row, SNOW_DEPTH_DELTA_COLUMN),
            snow_depth: row_f64(row, SNOW_DEPTH_COLUMN),
            air_temperature_observed_f: row_f64(row, AIR_TEMPERATURE_COLUMN),
        }
    }

    /// Parse a report body into observations for `station`, in row order.
    pub fn from_report(station: &Station, body: &str) -> Result<Vec<ObservationRecord>> {
        let rows = parse_report(body)?;
        Ok(rows
            .iter()
            .map(|row| ObservationRecord::from_row(station, row))
            .collect())
    }
}

impl Station {
    /// Fetch the daily report for this station over `start_date..=end_date`.
    pub async fn get_observations<S: AwdbSource>(
        &self,
        source: &S,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
    ) -> Result<Vec<ObservationRecord>> {
        let body = source.fetch_report_body(self, start_date, end_date).await?;
        let observations = ObservationRecord::from_report(self, &body)?;
        debug!(
            "{} observations for {} ({})",
            observations.len(),
            self.name,
            self.station_triplet
        );
        Ok(observations)
    }
}
