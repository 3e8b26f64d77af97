//! Run configuration, parsed from the command line.

use anyhow::bail;
use chrono::{Duration as DateDuration, Local, NaiveDate};
use clap::Args;
use snotel_awdb::client::{Endpoints, DEFAULT_CATALOG_URL, DEFAULT_NETWORKS, DEFAULT_REPORT_BASE_URL};
use snotel_awdb::fan_out::{default_concurrency, FailurePolicy, FanOutOptions};
use snotel_awdb::filter::{BoundingBox, MissingFieldPolicy, StationFilter};
use snotel_utils::dates::parse_date;
use std::path::PathBuf;
use std::time::Duration;

pub const CATALOG_FILE: &str = "stations.csv";
pub const ACTIVE_STATIONS_FILE: &str = "stations_active.csv";
pub const OBSERVATIONS_FILE: &str = "observations.csv";
pub const FAILURES_FILE: &str = "failed_stations.csv";

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Directory holding the catalog, active stations and observations CSVs
    #[arg(short = 'o', long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Western edge of the bounding box
    #[arg(long, default_value_t = -125.0, allow_negative_numbers = true)]
    pub min_lon: f64,

    /// Eastern edge of the bounding box
    #[arg(long, default_value_t = -100.0, allow_negative_numbers = true)]
    pub max_lon: f64,

    /// Southern edge of the bounding box
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    pub min_lat: f64,

    /// Northern edge of the bounding box
    #[arg(long, default_value_t = 49.0, allow_negative_numbers = true)]
    pub max_lat: f64,

    /// First day to fetch (defaults to one year before the end date)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Last day to fetch, inclusive (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Keep only stations whose end date is after this day
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date, default_value = "2050-01-01")]
    pub active_cutoff: NaiveDate,

    /// Keep stations with missing coordinates or end date instead of dropping them
    #[arg(long)]
    pub include_missing: bool,

    /// Record failing stations and continue instead of aborting the run
    #[arg(long)]
    pub skip_failed: bool,

    /// Reports fetched at once (defaults to available parallelism)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Comma separated network codes to request from the catalog; "all" for every network
    #[arg(long, default_value = DEFAULT_NETWORKS)]
    pub networks: String,

    #[arg(long, default_value = DEFAULT_CATALOG_URL, hide = true)]
    pub catalog_url: String,

    #[arg(long, default_value = DEFAULT_REPORT_BASE_URL, hide = true)]
    pub report_url: String,
}

/// Everything one run needs. Passed explicitly to every stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filter: StationFilter,
    pub fan_out: FanOutOptions,
    pub endpoints: Endpoints,
    pub timeout: Duration,
}

impl PipelineConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir.join(CATALOG_FILE)
    }

    pub fn active_stations_path(&self) -> PathBuf {
        self.output_dir.join(ACTIVE_STATIONS_FILE)
    }

    pub fn observations_path(&self) -> PathBuf {
        self.output_dir.join(OBSERVATIONS_FILE)
    }

    pub fn failures_path(&self) -> PathBuf {
        self.output_dir.join(FAILURES_FILE)
    }
}

impl TryFrom<PipelineArgs> for PipelineConfig {
    type Error = anyhow::Error;

    fn try_from(args: PipelineArgs) -> anyhow::Result<Self> {
        let end_date = args.end_date.unwrap_or_else(|| Local::now().date_naive());
        let start_date = args
            .start_date
            .unwrap_or_else(|| end_date - DateDuration::days(365));
        if start_date > end_date {
            bail!("start date {start_date} is after end date {end_date}");
        }
        let bounds = [args.min_lon, args.max_lon, args.min_lat, args.max_lat];
        if let Some(bad) = bounds.iter().find(|bound| !bound.is_finite()) {
            bail!("bounding box edges must be finite numbers, got {bad}");
        }
        if args.min_lon > args.max_lon || args.min_lat > args.max_lat {
            bail!(
                "bounding box is empty: lon [{}, {}], lat [{}, {}]",
                args.min_lon,
                args.max_lon,
                args.min_lat,
                args.max_lat
            );
        }
        let missing_field_policy = if args.include_missing {
            MissingFieldPolicy::Include
        } else {
            MissingFieldPolicy::Exclude
        };
        let failure_policy = if args.skip_failed {
            FailurePolicy::SkipFailed
        } else {
            FailurePolicy::FailFast
        };
        let networks = match args.networks.trim() {
            "" | "all" => None,
            codes => Some(codes.to_string()),
        };
        Ok(PipelineConfig {
            output_dir: args.output_dir,
            start_date,
            end_date,
            filter: StationFilter::new(
                BoundingBox::new(args.min_lon, args.max_lon, args.min_lat, args.max_lat),
                args.active_cutoff,
            )
            .with_missing_field_policy(missing_field_policy),
            fan_out: FanOutOptions {
                concurrency: args.concurrency.unwrap_or_else(default_concurrency),
                failure_policy,
            },
            endpoints: Endpoints {
                catalog_url: args.catalog_url,
                report_base_url: args.report_url,
                networks,
            },
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}
