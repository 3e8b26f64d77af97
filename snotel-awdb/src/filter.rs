//! Selects the active stations inside a geographic bounding box.

use crate::station::Station;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};

/// Rectangular geographic filter, inclusive on every edge.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> BoundingBox {
        BoundingBox {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    pub fn contains_latitude(&self, latitude: f64) -> bool {
        self.min_lat <= latitude && latitude <= self.max_lat
    }

    pub fn contains_longitude(&self, longitude: f64) -> bool {
        self.min_lon <= longitude && longitude <= self.max_lon
    }
}

impl Default for BoundingBox {
    /// Western conterminous United States.
    fn default() -> Self {
        BoundingBox::new(-125.0, -100.0, 25.0, 49.0)
    }
}

/// What to do with a station whose coordinates or end date are missing.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum MissingFieldPolicy {
    /// Drop the station.
    #[default]
    Exclude,
    /// Keep the station if every field that is present passes.
    Include,
}

#[derive(Debug, Clone)]
pub struct StationFilter {
    pub bounding_box: BoundingBox,
    /// Stations must stay active strictly after midnight of this day.
    pub active_cutoff: NaiveDate,
    pub missing_field_policy: MissingFieldPolicy,
}

impl StationFilter {
    pub fn new(bounding_box: BoundingBox, active_cutoff: NaiveDate) -> StationFilter {
        StationFilter {
            bounding_box,
            active_cutoff,
            missing_field_policy: MissingFieldPolicy::default(),
        }
    }

    pub fn with_missing_field_policy(mut self, policy: MissingFieldPolicy) -> StationFilter {
        self.missing_field_policy = policy;
        self
    }

    fn cutoff(&self) -> NaiveDateTime {
        self.active_cutoff.and_time(NaiveTime::default())
    }

    fn check<T>(&self, field: Option<T>, test: impl FnOnce(T) -> bool) -> bool {
        match field {
            Some(value) => test(value),
            None => self.missing_field_policy == MissingFieldPolicy::Include,
        }
    }

    pub fn accepts(&self, station: &Station) -> bool {
        let cutoff = self.cutoff();
        self.check(station.end_date, |end| end > cutoff)
            && self.check(station.latitude, |lat| {
                self.bounding_box.contains_latitude(lat)
            })
            && self.check(station.longitude, |lon| {
                self.bounding_box.contains_longitude(lon)
            })
    }

    /// Stable filter: the output keeps input order.
    pub fn apply(&self, stations: &[Station]) -> Vec<Station> {
        stations
            .iter()
            .filter(|station| {
                let keep = self.accepts(station);
                if !keep {
                    debug!("Filtered out {}", station.station_triplet);
                }
                keep
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::CatalogRecord;

    fn station(triplet: &str, lat: Option<f64>, lon: Option<f64>, end: Option<&str>) -> Station {
        Station {
            station_triplet: triplet.to_string(),
            name: triplet.to_string(),
            network_code: "SNTL".to_string(),
            elevation: None,
            latitude: lat,
            longitude: lon,
            begin_date: None,
            end_date: end.and_then(snotel_utils::dates::parse_awdb_datetime),
            record: CatalogRecord::new(),
        }
    }

    fn filter() -> StationFilter {
        StationFilter::new(
            BoundingBox::new(-125.0, -100.0, 25.0, 49.0),
            NaiveDate::from_ymd_opt(2050, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_active_station_inside_box_is_kept() {
        let s = station("A", Some(39.955), Some(-120.538), Some("2100-01-01 00:00"));
        assert!(filter().accepts(&s));
    }

    #[test]
    fn test_station_north_of_box_is_dropped() {
        let s = station("B", Some(50.147), Some(-119.053), Some("2100-01-01 00:00"));
        assert!(!filter().accepts(&s));
    }

    #[test]
    fn test_end_date_must_be_strictly_after_cutoff() {
        let on_cutoff = station("C", Some(40.0), Some(-110.0), Some("2050-01-01 00:00"));
        let before = station("D", Some(40.0), Some(-110.0), Some("2020-09-30 00:00"));
        let just_after = station("E", Some(40.0), Some(-110.0), Some("2050-01-01 00:01"));
        assert!(!filter().accepts(&on_cutoff));
        assert!(!filter().accepts(&before));
        assert!(filter().accepts(&just_after));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let corner = station("F", Some(49.0), Some(-125.0), Some("2100-01-01 00:00"));
        let other_corner = station("G", Some(25.0), Some(-100.0), Some("2100-01-01 00:00"));
        assert!(filter().accepts(&corner));
        assert!(filter().accepts(&other_corner));
    }

    #[test]
    fn test_missing_fields_excluded_by_default() {
        let no_lat = station("H", None, Some(-110.0), Some("2100-01-01 00:00"));
        let no_end = station("I", Some(40.0), Some(-110.0), None);
        assert!(!filter().accepts(&no_lat));
        assert!(!filter().accepts(&no_end));

        let lenient = filter().with_missing_field_policy(MissingFieldPolicy::Include);
        assert!(lenient.accepts(&no_lat));
        assert!(lenient.accepts(&no_end));
        let outside = station("J", None, Some(-90.0), None);
        assert!(!lenient.accepts(&outside));
    }

    #[test]
    fn test_apply_preserves_order() {
        let stations = vec![
            station("Z", Some(40.0), Some(-110.0), Some("2100-01-01 00:00")),
            station("Y", Some(60.0), Some(-110.0), Some("2100-01-01 00:00")),
            station("X", Some(41.0), Some(-111.0), Some("2100-01-01 00:00")),
        ];
        let kept: Vec<String> = filter()
            .apply(&stations)
            .into_iter()
            .map(|s| s.station_triplet)
            .collect();
        assert_eq!(kept, vec!["Z", "X"]);
    }
}
