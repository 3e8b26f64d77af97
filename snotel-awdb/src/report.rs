//! Reading the AWDB report generator's CSV output.
//!
//! Reports open with a block of `#`-prefixed metadata lines, followed by one
//! header line and one row per day.

use crate::error::{AwdbError, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;

pub const COMMENT_MARKER: char = '#';

/// One report row, keyed by column header.
pub type ReportRow = BTreeMap<String, String>;

/// Drop every line that starts with the comment marker. The remaining lines
/// keep their order. Applying this twice gives the same text as once.
pub fn strip_comments(body: &str) -> String {
    body.lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Parse a report body into rows. Comment lines are stripped first.
///
/// A header with no rows is an empty report, not an error. A body with no
/// header, or rows that do not match the header width, is malformed.
pub fn parse_report(body: &str) -> Result<Vec<ReportRow>> {
    let table = strip_comments(body);
    if table.trim().is_empty() {
        return Err(AwdbError::MalformedReport(
            "no header line after comment lines".to_string(),
        ));
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(table.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| AwdbError::MalformedReport(e.to_string()))?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(AwdbError::MalformedReport("empty header line".to_string()));
    }
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| AwdbError::MalformedReport(e.to_string()))?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect::<ReportRow>();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://wcc.sc.egov.usda.gov/reportGenerator/view_csv/customMultiTimeSeriesGroupByStationReport/daily/start_of_period/301:CA:SNTL%7Cid=%22%22%7Cname/2024-01-01,2024-01-03,0/WTEQ::value,WTEQ::delta,SNWD::value,SNWD::delta,TOBS::value
    const REPORT: &str = "#------------------------------------------------- WARNING --------------------------------------------
#
# The data you have obtained from this automated Natural Resources Conservation Service
# database are subject to revision regardless of indicated Quality Assurance level.
#
#------------------------------------------------------------------------------------------------------
Date,Snow Water Equivalent (in) Start of Day Values,Change In Snow Water Equivalent (in),Snow Depth (in) Start of Day Values,Change In Snow Depth (in),Air Temperature Observed (degF) Start of Day Values
2024-01-01,2.1,,9,,28
2024-01-02,2.3,0.2,11,2,25
2024-01-03,2.3,0.0,10,-1,31
";

    #[test]
    fn test_strip_comments() {
        let stripped = strip_comments(REPORT);
        assert!(stripped.starts_with("Date,"));
        assert_eq!(stripped.lines().count(), 4);
    }

    #[test]
    fn test_strip_comments_is_idempotent() {
        let once = strip_comments(REPORT);
        let twice = strip_comments(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strip_comments_keeps_inline_hashes() {
        let stripped = strip_comments("# meta\nDate,Name\n2024-01-01,Site #4\n");
        assert_eq!(stripped, "Date,Name\n2024-01-01,Site #4\n");
    }

    #[test]
    fn test_parse_report() {
        let rows = parse_report(REPORT).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["Date"], "2024-01-01");
        assert_eq!(rows[1]["Change In Snow Depth (in)"], "2");
        assert_eq!(rows[0]["Change In Snow Water Equivalent (in)"], "");
        assert_eq!(rows[2]["Date"], "2024-01-03");
    }

    #[test]
    fn test_header_only_report_is_empty() {
        let body = "# no data for this range\nDate,Snow Depth (in) Start of Day Values\n";
        let rows = parse_report(body).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_comment_only_report_is_malformed() {
        let err = parse_report("# station not found\n#\n").unwrap_err();
        assert!(matches!(err, AwdbError::MalformedReport(_)));
    }

    #[test]
    fn test_ragged_report_is_malformed() {
        let err = parse_report("Date,Snow Depth (in) Start of Day Values\n2024-01-01,4,9,9\n")
            .unwrap_err();
        assert!(matches!(err, AwdbError::MalformedReport(_)));
    }
}
