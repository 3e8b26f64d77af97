use crate::client::AwdbSource;
use crate::error::{AwdbError, Result};
use chrono::NaiveDateTime;
use log::{info, warn};
use serde_json::{Map, Value};
use snotel_utils::dates::parse_awdb_datetime;

/// One station object from the AWDB catalog, field order as served.
pub type CatalogRecord = Map<String, Value>;

pub const TRIPLET_FIELD: &str = "stationTriplet";
pub const NAME_FIELD: &str = "name";
pub const NETWORK_FIELD: &str = "networkCode";
pub const ELEVATION_FIELD: &str = "elevation";
pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";
pub const BEGIN_DATE_FIELD: &str = "beginDate";
pub const END_DATE_FIELD: &str = "endDate";

/// Represents an AWDB snow measurement station.
///
/// Coordinates, elevation and the activity window are optional because the
/// catalog does not guarantee them. The raw catalog record is kept alongside
/// so a filtered subset can be written back with the catalog's own columns.
///
/// See: <https://wcc.sc.egov.usda.gov/awdbRestApi/swagger-ui/index.html>
#[derive(Debug, PartialEq, Clone)]
pub struct Station {
    /// Compound identifier, `id:state:network` (e.g. "1000:OR:SNTL")
    pub station_triplet: String,
    /// Human-readable name of the station
    pub name: String,
    /// Network code (e.g. "SNTL")
    pub network_code: String,
    /// Elevation in feet
    pub elevation: Option<f64>,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    pub begin_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub record: CatalogRecord,
}

/// Look up a field as text. Numbers and booleans are rendered, null is absent.
pub fn field_str(record: &CatalogRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Look up a numeric field. Accepts JSON numbers and numeric strings, so a
/// catalog re-read from CSV converts the same way as one fresh from the API.
pub fn field_f64(record: &CatalogRecord, key: &str) -> Option<f64> {
    let value = match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

impl Station {
    /// Build a station from a catalog record. Returns `None` when the record
    /// carries no triplet, since nothing can be fetched for it.
    pub fn from_record(record: &CatalogRecord) -> Option<Station> {
        let station_triplet = field_str(record, TRIPLET_FIELD)?;
        let name = field_str(record, NAME_FIELD).unwrap_or_default();
        let network_code = field_str(record, NETWORK_FIELD)
            .or_else(|| station_triplet.rsplit(':').next().map(String::from))
            .unwrap_or_default();
        Some(Station {
            name,
            network_code,
            elevation: field_f64(record, ELEVATION_FIELD),
            latitude: field_f64(record, LATITUDE_FIELD),
            longitude: field_f64(record, LONGITUDE_FIELD),
            begin_date: field_str(record, BEGIN_DATE_FIELD)
                .as_deref()
                .and_then(parse_awdb_datetime),
            end_date: field_str(record, END_DATE_FIELD)
                .as_deref()
                .and_then(parse_awdb_datetime),
            record: record.clone(),
            station_triplet,
        })
    }

    /// Convert every usable catalog record, preserving catalog order.
    pub fn from_catalog(records: &[CatalogRecord]) -> Vec<Station> {
        let stations = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let station = Station::from_record(record);
                if station.is_none() {
                    warn!("Catalog record {} has no {}, skipping", index, TRIPLET_FIELD);
                }
                station
            })
            .collect::<Vec<Station>>();
        info!("{} of {} catalog records are stations", stations.len(), records.len());
        stations
    }
}

/// Parse a catalog response body: a JSON array of station objects.
pub fn parse_catalog(body: &str) -> Result<Vec<CatalogRecord>> {
    serde_json::from_str::<Vec<CatalogRecord>>(body).map_err(|e| AwdbError::Parse(e.to_string()))
}

/// Fetch and parse the full station catalog. No retry, no partial result.
pub async fn fetch_catalog<S: AwdbSource>(source: &S) -> Result<Vec<CatalogRecord>> {
    let body = source.fetch_catalog_body().await?;
    let records = parse_catalog(&body)?;
    info!("Fetched {} catalog records", records.len());
    Ok(records)
}
