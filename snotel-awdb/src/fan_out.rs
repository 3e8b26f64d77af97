//! Concurrent per-station fetching, merged back into station order.

use crate::client::AwdbSource;
use crate::error::{AwdbError, Result};
use crate::observation::ObservationRecord;
use crate::station::Station;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// What a single station's failure does to the whole run.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// The first failing station, in station order, aborts the run.
    #[default]
    FailFast,
    /// Failed stations are recorded and left out of the dataset.
    SkipFailed,
}

#[derive(Debug, Clone)]
pub struct FanOutOptions {
    /// Maximum number of reports in flight at once.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

/// Number of reports to keep in flight when nothing else is configured.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for FanOutOptions {
    fn default() -> Self {
        FanOutOptions {
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StationFailure {
    pub station_triplet: String,
    pub station_name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct FanOutOutcome {
    /// All observations, grouped by station in input order.
    pub observations: Vec<ObservationRecord>,
    pub failures: Vec<StationFailure>,
}

/// Fetch every station's report over `start_date..=end_date`.
///
/// Requests run concurrently, up to `options.concurrency` at a time, and may
/// finish in any order; results are still merged in the order of `stations`.
pub async fn fetch_all<S: AwdbSource>(
    source: &S,
    stations: &[Station],
    start_date: &NaiveDate,
    end_date: &NaiveDate,
    options: &FanOutOptions,
) -> Result<FanOutOutcome> {
    let concurrency = options.concurrency.max(1);
    info!(
        "Fetching {} stations from {} to {}, {} at a time",
        stations.len(),
        start_date,
        end_date,
        concurrency
    );
    let results = stream::iter(stations)
        .map(|station| async move {
            let result = station.get_observations(source, start_date, end_date).await;
            (station, result)
        })
        .buffered(concurrency);

    match options.failure_policy {
        FailurePolicy::FailFast => {
            let per_station = results
                .map(|(station, result)| {
                    result.map_err(|e| AwdbError::StationFetch {
                        triplet: station.station_triplet.clone(),
                        source: Box::new(e),
                    })
                })
                .try_collect::<Vec<Vec<ObservationRecord>>>()
                .await?;
            Ok(FanOutOutcome {
                observations: per_station.into_iter().flatten().collect(),
                failures: Vec::new(),
            })
        }
        FailurePolicy::SkipFailed => {
            let mut outcome = FanOutOutcome::default();
            let per_station = results.collect::<Vec<_>>().await;
            for (station, result) in per_station {
                match result {
                    Ok(observations) => outcome.observations.extend(observations),
                    Err(e) => {
                        warn!(
                            "Skipping {} ({}): {}",
                            station.name, station.station_triplet, e
                        );
                        outcome.failures.push(StationFailure {
                            station_triplet: station.station_triplet.clone(),
                            station_name: station.name.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            Ok(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::CatalogRecord;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeSource {
        /// triplet -> (delay in ms, body or failure)
        reports: HashMap<String, (u64, Option<String>)>,
        calls: AtomicUsize,
        completed: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(reports: &[(&str, u64, Option<&str>)]) -> FakeSource {
            FakeSource {
                reports: reports
                    .iter()
                    .map(|(t, d, b)| (t.to_string(), (*d, b.map(String::from))))
                    .collect(),
                calls: AtomicUsize::new(0),
                completed: Mutex::new(Vec::new()),
            }
        }
    }

    impl AwdbSource for FakeSource {
        async fn fetch_catalog_body(&self) -> Result<String> {
            Ok("[]".to_string())
        }

        async fn fetch_report_body(
            &self,
            station: &Station,
            _start_date: &NaiveDate,
            _end_date: &NaiveDate,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, body) = self
                .reports
                .get(&station.station_triplet)
                .cloned()
                .unwrap_or((0, None));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed
                .lock()
                .unwrap()
                .push(station.station_triplet.clone());
            body.ok_or_else(|| AwdbError::HttpStatus {
                url: station.station_triplet.clone(),
                status: 500,
            })
        }
    }

    fn station(triplet: &str) -> Station {
        Station {
            station_triplet: triplet.to_string(),
            name: format!("Station {triplet}"),
            network_code: "SNTL".to_string(),
            elevation: None,
            latitude: Some(40.0),
            longitude: Some(-110.0),
            begin_date: None,
            end_date: None,
            record: CatalogRecord::new(),
        }
    }

    fn report(day: &str) -> String {
        format!("# comment\nDate,Snow Depth (in) Start of Day Values\n{day},10\n")
    }

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    fn options(failure_policy: FailurePolicy) -> FanOutOptions {
        FanOutOptions {
            concurrency: 4,
            failure_policy,
        }
    }

    #[tokio::test]
    async fn test_output_follows_station_order_not_completion_order() {
        let a = report("2024-01-01");
        let b = report("2024-01-02");
        let source = FakeSource::new(&[
            ("A:CA:SNTL", 50, Some(a.as_str())),
            ("B:CA:SNTL", 0, Some(b.as_str())),
        ]);
        let stations = vec![station("A:CA:SNTL"), station("B:CA:SNTL")];
        let (start, end) = dates();
        let outcome = fetch_all(&source, &stations, &start, &end, &options(FailurePolicy::FailFast))
            .await
            .unwrap();

        assert_eq!(
            *source.completed.lock().unwrap(),
            vec!["B:CA:SNTL".to_string(), "A:CA:SNTL".to_string()]
        );
        let order: Vec<&str> = outcome
            .observations
            .iter()
            .map(|o| o.station_triplet.as_str())
            .collect();
        assert_eq!(order, vec!["A:CA:SNTL", "B:CA:SNTL"]);
        assert_eq!(outcome.observations[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_first_failure() {
        let ok = report("2024-01-01");
        let source = FakeSource::new(&[
            ("A:CA:SNTL", 0, Some(ok.as_str())),
            ("B:CA:SNTL", 0, None),
            ("C:CA:SNTL", 0, Some(ok.as_str())),
        ]);
        let stations = vec![station("A:CA:SNTL"), station("B:CA:SNTL"), station("C:CA:SNTL")];
        let (start, end) = dates();
        let err = fetch_all(&source, &stations, &start, &end, &options(FailurePolicy::FailFast))
            .await
            .unwrap_err();
        match err {
            AwdbError::StationFetch { triplet, source } => {
                assert_eq!(triplet, "B:CA:SNTL");
                assert!(source.is_network());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_skip_failed_records_failures() {
        let ok = report("2024-01-01");
        let source = FakeSource::new(&[
            ("A:CA:SNTL", 0, Some(ok.as_str())),
            ("B:CA:SNTL", 0, Some("# nothing but comments\n")),
            ("C:CA:SNTL", 0, Some(ok.as_str())),
        ]);
        let stations = vec![station("A:CA:SNTL"), station("B:CA:SNTL"), station("C:CA:SNTL")];
        let (start, end) = dates();
        let outcome = fetch_all(&source, &stations, &start, &end, &options(FailurePolicy::SkipFailed))
            .await
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.observations.len(), 2);
        assert_eq!(outcome.observations[1].station_triplet, "C:CA:SNTL");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].station_triplet, "B:CA:SNTL");
        assert!(outcome.failures[0].error.contains("Malformed report"));
    }

    #[tokio::test]
    async fn test_no_stations() {
        let source = FakeSource::new(&[]);
        let (start, end) = dates();
        let outcome = fetch_all(&source, &[], &start, &end, &FanOutOptions::default())
            .await
            .unwrap();
        assert!(outcome.observations.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
