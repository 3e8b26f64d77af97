//! Shared utility functions for SNOTEL crates.

/// Date utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Date format used for AWDB report URLs and CLI arguments: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Timestamp format used by the AWDB station catalog: "YYYY-MM-DD HH:MM"
    pub const AWDB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)?)
    }

    /// Parse an AWDB catalog timestamp.
    ///
    /// The catalog reports `beginDate`/`endDate` as "YYYY-MM-DD HH:MM". A bare
    /// "YYYY-MM-DD" is accepted as midnight. Anything else is `None`.
    pub fn parse_awdb_datetime(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, AWDB_DATETIME_FORMAT)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

}
