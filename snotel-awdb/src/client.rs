//! HTTP access to the AWDB station catalog and report generator.

use crate::error::{AwdbError, Result};
use crate::observation::ELEMENT_CODES;
use crate::station::Station;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use snotel_utils::dates::format_date;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://wcc.sc.egov.usda.gov/awdbRestApi/services/v1/stations";
pub const DEFAULT_REPORT_BASE_URL: &str = "https://wcc.sc.egov.usda.gov/reportGenerator/view_csv/customMultiTimeSeriesGroupByStationReport/daily/start_of_period";
pub const DEFAULT_NETWORKS: &str = "SNTL";

/// Where the catalog and reports are fetched from.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub catalog_url: String,
    pub report_base_url: String,
    /// Comma separated network codes, sent as `networkCds`. `None` asks for all.
    pub networks: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            report_base_url: DEFAULT_REPORT_BASE_URL.to_string(),
            networks: Some(DEFAULT_NETWORKS.to_string()),
        }
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| AwdbError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl Endpoints {
    /// Catalog request: active stations only, without forecast, reservoir or
    /// per-element metadata.
    pub fn catalog_url(&self) -> Result<Url> {
        let mut url = parse_url(&self.catalog_url)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("activeOnly", "true")
                .append_pair("returnForecastPointMetadata", "false")
                .append_pair("returnReservoirMetadata", "false")
                .append_pair("returnStationElements", "false");
            if let Some(networks) = self.networks.as_deref() {
                query.append_pair("networkCds", networks);
            }
        }
        Ok(url)
    }

    /// Daily report request for one station. Each path segment is
    /// percent-encoded; the triplet itself is passed through untouched.
    pub fn report_url(
        &self,
        station_triplet: &str,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
    ) -> Result<Url> {
        let mut url = parse_url(&self.report_base_url)?;
        url.path_segments_mut()
            .map_err(|_| AwdbError::InvalidUrl {
                url: self.report_base_url.clone(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(&format!("{station_triplet}|id=\"\"|name"))
            .push(&format!(
                "{},{},0",
                format_date(start_date),
                format_date(end_date)
            ))
            .push(&ELEMENT_CODES.join(","));
        Ok(url)
    }
}

/// Source of raw catalog and report bodies.
pub trait AwdbSource {
    fn fetch_catalog_body(&self) -> impl Future<Output = Result<String>> + Send;

    fn fetch_report_body(
        &self,
        station: &Station,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// `AwdbSource` backed by the live web services.
#[derive(Debug, Clone)]
pub struct AwdbClient {
    client: Client,
    endpoints: Endpoints,
}

impl AwdbClient {
    /// Build a client whose requests each give up after `timeout`.
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<AwdbClient> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AwdbError::ClientBuild(e.to_string()))?;
        Ok(AwdbClient { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AwdbError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            warn!("Bad response status for {}: {}", url, status);
            return Err(AwdbError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|e| AwdbError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AwdbSource for AwdbClient {
    async fn fetch_catalog_body(&self) -> Result<String> {
        let url = self.endpoints.catalog_url()?;
        self.get_text(url).await
    }

    async fn fetch_report_body(
        &self,
        station: &Station,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
    ) -> Result<String> {
        let url = self
            .endpoints
            .report_url(&station.station_triplet, start_date, end_date)?;
        self.get_text(url).await
    }
}
